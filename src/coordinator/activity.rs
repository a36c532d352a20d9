use crate::response::envelope::ResponseData;

/// External activity state owned by the surrounding session subsystem.
///
/// Callbacks run on the coordinator worker task, so they must return quickly
/// and must not block on the coordinator itself.
pub trait ActivityHandler: Send + Sync {
    /// Raised while a server-directed retry is pending, cleared on a final answer.
    fn set_asking_attribution(&self, asking: bool);

    /// Receives a finalized session response, possibly carrying an attribution.
    ///
    /// A session response carrying `ask_in` is never passed here: it only
    /// raises the asking flag and schedules a lookup, and the host hears back
    /// through [`launch_attribution_response_tasks`] once that lookup is final.
    ///
    /// [`launch_attribution_response_tasks`]: ActivityHandler::launch_attribution_response_tasks
    fn launch_session_response_tasks(&self, response: ResponseData);

    /// Receives a finalized attribution response, possibly carrying an attribution.
    fn launch_attribution_response_tasks(&self, response: ResponseData);
}
