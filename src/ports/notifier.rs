use crate::domain::events::ChangeEvent;

/// Receives change events from the scanner.
///
/// Implementations must return promptly: the scanner calls `notify` inline,
/// once per detected change.
#[cfg_attr(test, mockall::automock)]
pub trait ChangeNotifier: Send + Sync {
    fn notify(&self, event: &ChangeEvent);
}
