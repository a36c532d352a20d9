mod coordinator_flow;
mod http_transport;
