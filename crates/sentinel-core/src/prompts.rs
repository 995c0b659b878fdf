//! Prompt text for the three model roles.

use sentinel_exec::AI_TEST_CONTRACT;

/// Audit prompt: source in, JSON findings out.
pub fn audit_prompt(source: &str) -> String {
    format!(
        "You are a smart-contract security auditor. Review the Solidity source below \
and respond with ONLY a JSON object, no prose, of the form:\n\
{{\"riskScore\": \"Low\" | \"Medium\" | \"High\" | \"Critical\", \
\"summary\": string, \
\"findings\": [{{\"title\": string, \"description\": string, \
\"severity\": \"Low\" | \"Medium\" | \"High\" | \"Critical\", \"recommendation\": string}}]}}\n\
Use an empty findings array when nothing is wrong.\n\n\
Source:\n{source}"
    )
}

/// Test-generation prompt: ABI in, one fenced Foundry test out.
pub fn test_generation_prompt(abi: &str) -> String {
    format!(
        "Write a complete Foundry invariant/fuzz test contract named `{AI_TEST_CONTRACT}` \
for the contract described by the ABI below. The target is deployed at the address in \
the TARGET_ADDRESS environment variable on a forked network. Focus on functions that \
transfer value, mint or burn supply, or change critical parameters such as owners, fees \
and pause flags. Return the whole file in a single ```solidity fenced code block.\n\n\
ABI:\n{abi}"
    )
}

/// Interpretation prompt: failure log in, plain-language explanation out.
pub fn failure_interpretation_prompt(log: &str) -> String {
    format!(
        "A Foundry fuzz test against a smart contract failed. From the log below, name the \
failing function, list the counterexample inputs, and explain in plain language the \
vulnerability the failure most likely reveals. Keep it short.\n\n\
Log:\n{log}"
    )
}
