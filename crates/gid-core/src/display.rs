//! Output side of the chat, kept behind a trait so the controller can run
//! without a browser or terminal.

use crate::state::Role;

pub trait DisplaySink {
    /// Show the city indicator with `Some`, hide it with `None`.
    fn show_city(&mut self, city: Option<&str>);

    /// Append an HTML fragment to the transcript view and scroll to it.
    fn append(&mut self, role: Role, html: &str);

    /// Disable (`true`) or re-enable (`false`) input while a request is in flight.
    fn set_busy(&mut self, busy: bool);

    /// One-off acknowledgment outside the transcript.
    fn notify(&mut self, text: &str);

    /// Remove everything from the transcript view.
    fn clear(&mut self);
}
