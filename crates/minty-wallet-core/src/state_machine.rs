use serde::{Deserialize, Serialize};

use crate::domain::{ActionLabels, ControlView};
use crate::ports::{ControlPort, PortError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleStatus {
    Idle,
    Pending,
    Submitted,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Start,
    Submit,
    Confirm,
    Fail,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: LifecycleStatus,
    pub to: LifecycleStatus,
    pub reason: &'static str,
}

pub fn lifecycle_transition(
    from: LifecycleStatus,
    event: LifecycleEvent,
) -> Result<(LifecycleStatus, StateTransition), PortError> {
    use LifecycleEvent as E;
    use LifecycleStatus as S;

    let (to, reason) = match (from, event) {
        (S::Idle, E::Start) => (S::Pending, "control disabled for wallet interaction"),
        (S::Pending, E::Submit) => (S::Submitted, "transaction broadcast"),
        (S::Pending, E::Confirm) => (S::Confirmed, "completed without transaction"),
        (S::Submitted, E::Confirm) => (S::Confirmed, "inclusion receipt resolved"),
        (S::Pending, E::Fail) => (S::Failed, "aborted before broadcast"),
        (S::Submitted, E::Fail) => (S::Failed, "transaction failed on chain"),
        (S::Failed, E::Reset) => (S::Idle, "control re-enabled for retry"),
        _ => {
            return Err(PortError::Validation(format!(
                "illegal lifecycle transition: {from:?} on {event:?}"
            )))
        }
    };
    Ok((
        to,
        StateTransition {
            from,
            to,
            reason,
        },
    ))
}

/// Drives one control through a single action's lifecycle, rendering the
/// matching view after every transition.
pub struct TrackedControl<'a, C: ControlPort + ?Sized> {
    control: &'a C,
    labels: ActionLabels,
    status: LifecycleStatus,
    history: Vec<StateTransition>,
}

impl<'a, C: ControlPort + ?Sized> TrackedControl<'a, C> {
    pub fn new(control: &'a C, labels: ActionLabels) -> Self {
        Self {
            control,
            labels,
            status: LifecycleStatus::Idle,
            history: Vec::new(),
        }
    }

    pub fn control(&self) -> &'a C {
        self.control
    }

    pub fn status(&self) -> LifecycleStatus {
        self.status
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub fn start(&mut self) -> Result<(), PortError> {
        self.advance(LifecycleEvent::Start)?;
        self.render(self.labels.pending, true, true);
        Ok(())
    }

    pub fn submitted(&mut self) -> Result<(), PortError> {
        self.advance(LifecycleEvent::Submit)?;
        self.render(self.labels.submitted, true, true);
        Ok(())
    }

    /// `label` overrides the static confirmed label (e.g. the connected address).
    pub fn confirmed(&mut self, label: Option<String>) -> Result<(), PortError> {
        self.advance(LifecycleEvent::Confirm)?;
        let label = label.unwrap_or_else(|| self.labels.confirmed.to_owned());
        self.control.render(&ControlView {
            label,
            busy: false,
            disabled: true,
        });
        Ok(())
    }

    /// Marks the attempt failed and hands the control back to the user. Never
    /// fails: whatever state the control reached, it ends idle and enabled.
    pub fn fail(&mut self) {
        if self.advance(LifecycleEvent::Fail).is_ok() {
            let _ = self.advance(LifecycleEvent::Reset);
        }
        self.status = LifecycleStatus::Idle;
        self.render(self.labels.idle, false, false);
    }

    fn advance(&mut self, event: LifecycleEvent) -> Result<(), PortError> {
        let (to, transition) = lifecycle_transition(self.status, event)?;
        tracing::debug!(
            from = ?transition.from,
            to = ?transition.to,
            reason = transition.reason,
            "control lifecycle"
        );
        self.status = to;
        self.history.push(transition);
        Ok(())
    }

    fn render(&self, label: &str, busy: bool, disabled: bool) {
        self.control.render(&ControlView {
            label: label.to_owned(),
            busy,
            disabled,
        });
    }
}
