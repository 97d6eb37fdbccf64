use crate::{PolicyId, RunId, Store};
use std::str::FromStr;

/// Whether household charts show the average of all households of a policy,
/// or one household picked at random.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Average of all households following the policy
    #[default]
    Average,

    /// One random household following the policy
    Random,
}

impl Mode {
    /// Prefix of chart titles, e.g. `"Average "`.
    #[must_use]
    pub fn title_prefix(self) -> &'static str {
        match self {
            Self::Average => "Average ",
            Self::Random => "Random ",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Average => write!(f, "average"),
            Self::Random => write!(f, "random"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "average" | "avg" => Ok(Self::Average),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown mode {other:?}, expected \"average\" or \"random\"")),
        }
    }
}

/// Identifies which results a chart build reads.
///
/// Owned by the caller and never modified by the aggregation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunContext {
    run_id: RunId,
    run_label: String,
    policy_id: Option<PolicyId>,
    mode: Mode,
}

impl RunContext {
    /// Creates a context for a whole run.
    pub fn new<S: Into<String>>(run_id: RunId, run_label: S) -> Self {
        Self {
            run_id,
            run_label: run_label.into(),
            policy_id: None,
            mode: Mode::default(),
        }
    }

    /// Creates a context for a whole run, labelled by its date in the store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownRun`] if the run does not exist.
    pub fn load(store: &Store, run_id: RunId) -> crate::Result<Self> {
        let info = store.run_info(run_id)?;
        Ok(Self::new(run_id, info.label()))
    }

    /// Narrows the context to one policy.
    #[must_use]
    pub fn with_policy(mut self, policy_id: PolicyId, mode: Mode) -> Self {
        self.policy_id = Some(policy_id);
        self.mode = mode;
        self
    }

    /// Run ID
    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Label of the run used in chart titles
    #[must_use]
    pub fn run_label(&self) -> &str {
        &self.run_label
    }

    /// Policy, if the context is narrowed to one
    #[must_use]
    pub fn policy_id(&self) -> Option<PolicyId> {
        self.policy_id
    }

    /// Household mode
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn mode_parse() {
        assert_eq!(Ok(Mode::Average), "average".parse());
        assert_eq!(Ok(Mode::Random), "Random".parse());
        assert!("median".parse::<Mode>().is_err());
        assert_eq!("random", Mode::Random.to_string());
    }

    #[test_log::test]
    fn context_load() -> crate::Result<()> {
        let store = Store::builder().create_schema(true).open_in_memory()?;
        store.insert_run(1, 1_331_130_600_000)?;

        let ctx = RunContext::load(&store, 1)?.with_policy(3, Mode::Random);
        assert_eq!("7 Mar 2012 14:30:00 GMT", ctx.run_label());
        assert_eq!(Some(3), ctx.policy_id());
        assert_eq!(Mode::Random, ctx.mode());

        assert!(RunContext::load(&store, 2).is_err());

        Ok(())
    }
}
