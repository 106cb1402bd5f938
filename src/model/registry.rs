use std::fmt::Display;

/// The declarative registration of a provider task: its name and the
/// configuration keys that gate its execution.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TaskRegistration {
    /// The provider name, also the cache sub-directory.
    pub name: &'static str,

    /// Keys that must all be set and non-empty for the task to run.
    pub required_keys: &'static [&'static str],

    /// Keys of which at least one must be set and non-empty, when not empty.
    pub any_of_keys: &'static [&'static str],
}

impl TaskRegistration {
    /// Whether the task is eligible to run given a configuration lookup.
    pub fn is_eligible<F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_set = |key: &str| lookup(key).is_some_and(|value| !value.is_empty());
        let has_required_keys = self.required_keys.iter().all(|key| is_set(key));
        let has_any_of_keys =
            self.any_of_keys.is_empty() || self.any_of_keys.iter().any(|key| is_set(key));

        has_required_keys && has_any_of_keys
    }
}

impl Display for TaskRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TaskRegistration: name={}, required_keys={:?}",
            self.name, self.required_keys
        )
    }
}

/// The static registry of all provider tasks.
pub const TASK_REGISTRY: &[TaskRegistration] = &[
    TaskRegistration {
        name: "aur",
        required_keys: &["DASHBOARD_AUR_REPOS"],
        any_of_keys: &[],
    },
    TaskRegistration {
        name: "codecov",
        required_keys: &["CODECOV_TOKEN", "GITHUB_REPOSITORY_OWNER"],
        any_of_keys: &[],
    },
    TaskRegistration {
        name: "crowdin",
        required_keys: &["CROWDIN_TOKEN"],
        any_of_keys: &[],
    },
    TaskRegistration {
        name: "discord",
        required_keys: &["DISCORD_INVITE"],
        any_of_keys: &[],
    },
    TaskRegistration {
        name: "facebook",
        required_keys: &["FACEBOOK_TOKEN"],
        any_of_keys: &["FACEBOOK_GROUP_ID", "FACEBOOK_PAGE_ID"],
    },
    TaskRegistration {
        name: "github",
        required_keys: &["GITHUB_TOKEN", "GITHUB_REPOSITORY_OWNER"],
        any_of_keys: &[],
    },
    TaskRegistration {
        name: "patreon",
        required_keys: &["PATREON_CAMPAIGN_ID"],
        any_of_keys: &[],
    },
    TaskRegistration {
        name: "readthedocs",
        required_keys: &["READTHEDOCS_TOKEN"],
        any_of_keys: &[],
    },
];

/// Evaluates the registry against a configuration lookup and returns the
/// eligible tasks. Tasks with missing keys are silently omitted.
pub fn eligible_tasks<'a, F>(
    registry: &'a [TaskRegistration],
    lookup: F,
) -> Vec<&'a TaskRegistration>
where
    F: Fn(&str) -> Option<String>,
{
    registry
        .iter()
        .filter(|registration| registration.is_eligible(&lookup))
        .collect()
}
