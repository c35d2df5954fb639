use minty_wallet_core::{ControlPort, ControlView};

/// Terminal stand-in for a page button: renders become log lines, alerts go to stdout.
#[derive(Debug, Default)]
pub struct ConsoleControl;

impl ControlPort for ConsoleControl {
    fn render(&self, view: &ControlView) {
        tracing::info!(
            label = %view.label,
            busy = view.busy,
            disabled = view.disabled,
            "control"
        );
    }

    fn alert(&self, message: &str) {
        println!("{message}");
    }
}
