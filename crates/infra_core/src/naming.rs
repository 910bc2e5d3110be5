use serde::{Deserialize, Serialize};

use crate::error::{CompositionError, Result};

/// Project and environment prefix used for deterministic physical names.
///
/// Passed explicitly into every stack constructor through its scope; there is
/// no process-wide naming state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingContext {
    project: String,
    environment: String,
}

impl NamingContext {
    pub fn new(project: impl Into<String>, environment: impl Into<String>) -> Result<Self> {
        let project = project.into().trim().to_string();
        let environment = environment.into().trim().to_string();
        validate_part("project", &project)?;
        validate_part("environment", &environment)?;
        Ok(Self {
            project,
            environment,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// `{project}{environment}{logical}`.
    pub fn qualify(&self, logical: &str) -> String {
        format!("{}{}{logical}", self.project, self.environment)
    }
}

fn validate_part(label: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CompositionError::configuration(format!(
            "naming {label} cannot be empty"
        )));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CompositionError::configuration(format!(
            "naming {label} '{value}' must be ASCII alphanumeric"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_concatenates_project_environment_and_logical_name() {
        let naming = NamingContext::new("todo", "dev").expect("naming should pass");
        assert_eq!(naming.qualify("TodoUserPool"), "tododevTodoUserPool");
    }

    #[test]
    fn rejects_empty_and_non_alphanumeric_parts() {
        let error = NamingContext::new(" ", "dev").expect_err("empty project should fail");
        assert_eq!(
            error,
            CompositionError::configuration("naming project cannot be empty")
        );

        let error = NamingContext::new("todo", "dev-1").expect_err("hyphen should fail");
        assert_eq!(
            error,
            CompositionError::configuration("naming environment 'dev-1' must be ASCII alphanumeric")
        );
    }
}
