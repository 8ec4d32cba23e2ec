use async_trait::async_trait;

use super::{GenerationRequest, TextGenerator};
use crate::error::Result;

const MOCK_NOTE: &str = "*Note: This is a mock response. Configure AI provider for real analysis.*";

/// Canned responses used whenever no AI provider is reachable.
///
/// The reply is chosen by keywords in the prompt, so callers still receive
/// text shaped like the advice they asked for.
#[derive(Debug, Clone, Default)]
pub struct MockTextGenerator;

impl MockTextGenerator {
    pub fn respond(prompt: &str) -> String {
        let prompt = prompt.to_lowercase();

        if prompt.contains("code review") {
            format!(
                "Based on the code diff analysis:\n\n\
                 **Issues Found:**\n\
                 1. **Security**: Potential SQL injection vulnerability in line 15\n\
                 2. **Performance**: Inefficient loop in the data processing section\n\
                 3. **Code Style**: Missing error handling for API calls\n\n\
                 **Suggestions:**\n\
                 - Use parameterized queries for database operations\n\
                 - Add error handling around external API calls\n\n\
                 **Overall Score: 7.2/10**\n{MOCK_NOTE}"
            )
        } else if prompt.contains("pipeline") {
            format!(
                "Pipeline optimization analysis:\n\n\
                 **Optimization Opportunities:**\n\
                 1. **Parallelization**: Jobs can run in parallel to reduce build time\n\
                 2. **Caching**: Add dependency caching to speed up builds\n\
                 3. **Resource Optimization**: Right-size container resources\n\n\
                 **Recommendations:**\n\
                 - Use matrix builds for testing multiple environments\n\
                 - Implement proper artifact caching strategy\n\
                 - Consider using faster base images\n\n\
                 **Estimated Time Savings: 40%**\n{MOCK_NOTE}"
            )
        } else if prompt.contains("test") {
            format!(
                "Test generation analysis:\n\n\
                 **Generated Test Cases:**\n\
                 1. **Unit Tests**: 12 new test cases for uncovered functions\n\
                 2. **Integration Tests**: 5 API endpoint tests\n\
                 3. **Edge Cases**: 8 boundary condition tests\n\n\
                 **Coverage Improvement:**\n\
                 - Current: 72% -> Target: 90%\n{MOCK_NOTE}"
            )
        } else {
            "AI analysis complete. Configure API keys for detailed insights.".to_string()
        }
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        Ok(Self::respond(&request.prompt))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_reply_by_keyword() {
        assert!(MockTextGenerator::respond("Please do a Code Review").contains("Overall Score"));
        assert!(MockTextGenerator::respond("optimize this pipeline")
            .contains("Estimated Time Savings"));
        assert!(MockTextGenerator::respond("write a test").contains("Generated Test Cases"));
        assert!(MockTextGenerator::respond("hello").starts_with("AI analysis complete"));
    }

    #[tokio::test]
    async fn generate_never_fails() {
        let reply = MockTextGenerator
            .generate(&GenerationRequest::new("pipeline"))
            .await
            .unwrap();
        assert!(reply.contains("mock response"));
    }

    #[test]
    fn generic_prompt_gets_generic_reply() {
        let reply = tokio_test::block_on(MockTextGenerator.generate(&GenerationRequest::new("hi")))
            .unwrap();
        assert_eq!(reply, "AI analysis complete. Configure API keys for detailed insights.");
        assert_eq!(MockTextGenerator.name(), "mock");
    }
}
