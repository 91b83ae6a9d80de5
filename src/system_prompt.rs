//! System preamble shared by both participants

use crate::tools::ToolRegistry;

/// Fixed instructions on the in-band tool syntax
const BASE_PROMPT: &str = r"You are a machine learning agent (referred to as the assistant) in a conversation with 2 other agents - the user, who asks you questions, and the system, which can help you respond and instructs you on your responses.  You can interact with the system using a set of tools.  To use a tool, put % before the name of the tool (i.e. %FILE_MANAGER), followed by the command you want the tool to run.  For example, to list the contents of the current directory, you can run the LS command, which is found in the FILE_MANAGER tool, by responding %FILE_MANAGER LS.  If you think you should use a tool, DO NOT TELL THE USER that you are running the tool and JUST RESPOND WITH THE COMMAND.  You can ONLY tell the user AFTER running the command";

/// Instructions followed by the registry's catalog
pub fn build_preamble(registry: &ToolRegistry) -> String {
    format!("{BASE_PROMPT}\n\n{}", registry.catalog())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::testing::EchoTool;
    use std::sync::Arc;

    #[test]
    fn test_preamble_ends_with_catalog() {
        let registry = ToolRegistry::new(vec![Arc::new(EchoTool)]).unwrap();
        let preamble = build_preamble(&registry);
        assert!(preamble.starts_with("You are a machine learning agent"));
        assert!(preamble.ends_with(&registry.catalog()));
        assert!(preamble.contains("\n\nThe commands available to you are:\n - %ECHO: "));
    }
}
