use serde::Serialize;

use crate::confirmation::ConfirmationState;
use crate::session::SessionSnapshot;

/// Where the email confirmation gate currently stands for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EmailGate {
    Loading,
    Unauthenticated { redirect_to: String, return_to: String },
    Unconfirmed { is_healthcare_professional: bool },
    Confirmed,
}

/// One render branch per gate state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatedView<N> {
    Loading,
    Redirect { to: String, from: String },
    ConfirmationRequired { is_healthcare_professional: bool },
    Children(N),
}

impl EmailGate {
    pub fn render<N>(self, children: N) -> GatedView<N> {
        match self {
            EmailGate::Loading => GatedView::Loading,
            EmailGate::Unauthenticated { redirect_to, return_to } => GatedView::Redirect {
                to: redirect_to,
                from: return_to,
            },
            EmailGate::Unconfirmed { is_healthcare_professional } => {
                GatedView::ConfirmationRequired { is_healthcare_professional }
            }
            EmailGate::Confirmed => GatedView::Children(children),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, EmailGate::Confirmed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfirmationGuard {
    pub auth_entry_path: String,
    /// Only changes the copy of the confirmation view
    pub is_healthcare_professional: bool,
}

impl EmailConfirmationGuard {
    pub fn new(auth_entry_path: impl Into<String>) -> Self {
        Self {
            auth_entry_path: auth_entry_path.into(),
            is_healthcare_professional: false,
        }
    }

    pub fn healthcare_professional(mut self, value: bool) -> Self {
        self.is_healthcare_professional = value;
        self
    }

    /// A confirmation state that belongs to another identity, or that has
    /// not completed a check yet, never yields a decision other than Loading.
    pub fn evaluate(
        &self,
        session: &SessionSnapshot,
        confirmation: &ConfirmationState,
        location: &str,
    ) -> EmailGate {
        if session.loading {
            return EmailGate::Loading;
        }

        let Some(user) = session.user.as_ref() else {
            return EmailGate::Unauthenticated {
                redirect_to: self.auth_entry_path.clone(),
                return_to: location.to_string(),
            };
        };

        if confirmation.user_id != Some(user.id)
            || !confirmation.has_checked
            || confirmation.is_checking
        {
            return EmailGate::Loading;
        }

        if confirmation.is_confirmed {
            EmailGate::Confirmed
        } else {
            tracing::debug!("User {} has not confirmed their email", user.id);
            EmailGate::Unconfirmed {
                is_healthcare_professional: self.is_healthcare_professional,
            }
        }
    }
}
