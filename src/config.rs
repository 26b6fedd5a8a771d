//! Runner configuration
//!
//! Which converter to invoke and what the generated script is called.

/// Default converter command line (the notebook path is appended).
pub const DEFAULT_CONVERTER: &str = "jupyter nbconvert --to script";

/// Extension nbconvert gives Python notebooks.
pub const DEFAULT_SCRIPT_EXT: &str = "py";

/// Configuration for converting and running notebooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Converter executable
    pub converter_program: String,
    /// Arguments placed before the notebook path
    pub converter_args: Vec<String>,
    /// Extension of the script the converter writes, without the dot
    pub script_ext: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let (program, args) = split_command(DEFAULT_CONVERTER).unwrap_or_default();
        Self {
            converter_program: program,
            converter_args: args,
            script_ext: DEFAULT_SCRIPT_EXT.to_string(),
        }
    }
}

impl RunnerConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the converter from a whitespace-separated command line.
    ///
    /// An empty command line leaves the current converter in place.
    pub fn with_converter_command(mut self, command: &str) -> Self {
        if let Some((program, args)) = split_command(command) {
            self.converter_program = program;
            self.converter_args = args;
        }
        self
    }

    /// Set the generated script extension (a leading dot is ignored)
    pub fn with_script_ext(mut self, ext: &str) -> Self {
        self.script_ext = ext.trim_start_matches('.').to_string();
        self
    }
}

fn split_command(command: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_nbconvert() {
        let config = RunnerConfig::default();
        assert_eq!(config.converter_program, "jupyter");
        assert_eq!(config.converter_args, vec!["nbconvert", "--to", "script"]);
        assert_eq!(config.script_ext, "py");
    }

    #[test]
    fn test_converter_command_is_split_on_whitespace() {
        let config = RunnerConfig::new().with_converter_command("  sh  fake.sh ");
        assert_eq!(config.converter_program, "sh");
        assert_eq!(config.converter_args, vec!["fake.sh"]);
    }

    #[test]
    fn test_empty_converter_command_is_ignored() {
        let config = RunnerConfig::new().with_converter_command("   ");
        assert_eq!(config, RunnerConfig::default());
    }

    #[test]
    fn test_script_ext_drops_leading_dot() {
        let config = RunnerConfig::new().with_script_ext(".r");
        assert_eq!(config.script_ext, "r");
    }
}
