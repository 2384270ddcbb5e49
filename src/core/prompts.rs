//! Prompt construction for every LLM stage.
//!
//! Prompt wording is content, not logic; the builders only make sure each
//! stage embeds the right inputs verbatim.

use crate::domain::model::UserInput;

/// Sentence the auditor is asked to reply with when a network is complete.
/// `valid_prefix` must match the prefix the verdict predicate accepts.
pub fn network_valid_sentence(valid_prefix: &str) -> String {
    format!("{valid_prefix}: All CPTs, states, and connections present and explicit for every node.")
}

/// Sentence the auditor is asked to reply with when a diagram is complete.
pub fn diagram_valid_sentence(valid_prefix: &str) -> String {
    format!("{valid_prefix}: Every node and every edge of the network appears in the diagram.")
}

const NETWORK_REQUIREMENTS: &str = r#"Build a reconfigurable Bayesian Network that explains why this persona reaches a decision, not only what the decision is.

Guiding principles:
- Causal reasoning over correlation: every edge must be a plausible psychological or situational cause, and you must justify it.
- Model the conflict: identify the central trade-off inside the persona and make it drive the network.
- Synthesize, do not list: combine low-level data (location, occupation, traits) into higher-level concepts such as an Analytical_Thinking_Index.

Step 1 - Persona Core Synthesis:
1. Foundational narrative (2-3 sentences) about the person as it relates to the decision.
2. Primary psychological driver, derived from their personality traits.
3. The core conflict they face when making this decision, stated explicitly.

Step 2 - Network architecture, in two phases:
Phase 1, context and elimination:
- Root evidence nodes for the provided data; the observed state has probability 1.0 and every other state 0.0.
- At least two synthesized context nodes inferred from the root evidence.
- Elimination criteria nodes: the practical filters the persona applies first, children of root and synthesized nodes.
Phase 2, value-based selection:
- Value driver nodes influenced by the personality traits and the core conflict.
- One final decision node with every plausible answer as a state.

Step 3 - Justification-first parameterization. For every node except root evidence give:
- Node name and type
- Possible states
- Causal justification: bullet points explaining how each parent shifts the probabilities, referencing the core conflict
- Conditional Probability Table covering every combination of parent states, each row summing to 1

Step 4 - Output, in this exact order:
1. Persona Core Synthesis
2. Network edges, one per line as [Parent] -> [Child]
3. Phase 1 node details
4. Phase 2 node details
5. Reconfiguration guide: how to change the core conflict and which CPT rationales to revisit

The network must be usable for probabilistic inference in the described situation."#;

fn diagram_rules(header: &str) -> String {
    format!(
        r#"FORMATTING REQUIREMENTS:
1. The first line must be exactly "{header}"
2. Each node and each connection MUST be on its own line
3. Node ids use no spaces (underscores or camelCase)
4. Declare nodes as rectangular boxes: NodeId["Display Name"]
5. Declare dependencies as arrows: ParentId --> ChildId
6. Show every parent-child relationship of the network
7. Output only the diagram code: no explanations, no markdown, no code fences

Example format:
{header}
    A["Node A"]
    B["Node B"]
    C["Node C"]
    A --> B
    A --> C
    B --> C"#
    )
}

pub fn synthesis_prompt(input: &UserInput) -> String {
    format!(
        "You are a cognitive modeler and an expert in psychometric network analysis. \
Architect a simulation of a specific persona's decision-making process for the situation below.\n\n\
SITUATION DESCRIPTION:\n{}\n\nJSON DATA:\n{}\n\n{}",
        input.situation_description,
        input.pretty_json(),
        NETWORK_REQUIREMENTS
    )
}

pub fn network_audit_prompt(network: &str, valid_prefix: &str) -> String {
    let sentence = network_valid_sentence(valid_prefix);
    format!(
        r#"Your job is to strictly audit the following Bayesian Network specification. These must all be present:
1. Each non-evidence node: complete list of possible states
2. Every node: explicit Conditional Probability Table covering all parent states, each row adding up to 1
3. Every node: all parent-child connections (edges)
4. No missing details for the above

If anything is missing, enumerate the node, what is missing, and how to fix it.
If everything is present, reply starting with: "{sentence}"
--- Output ---
{network}"#
    )
}

pub fn network_correction_prompt(input: &UserInput, defects: &str) -> String {
    format!(
        "Revise and regenerate the Bayesian Network specification. Incorporate each missing element \
or fix listed below, making sure every node, connection, and CPT is complete and clearly listed.\n\n\
REVIEW FEEDBACK:\n{}\n\nSITUATION DESCRIPTION:\n{}\n\nJSON DATA:\n{}\n\n{}",
        defects,
        input.situation_description,
        input.pretty_json(),
        NETWORK_REQUIREMENTS
    )
}

pub fn diagram_prompt(network: &str, header: &str) -> String {
    format!(
        "Convert the following Bayesian network description into a Mermaid flowchart diagram.\n\n\
{}\n\nBAYESIAN NETWORK DESCRIPTION:\n{}\n\nGenerate ONLY the Mermaid code, starting with \"{}\".",
        diagram_rules(header),
        network,
        header
    )
}

pub fn diagram_audit_prompt(network: &str, diagram: &str, valid_prefix: &str) -> String {
    let sentence = diagram_valid_sentence(valid_prefix);
    format!(
        r#"Check a Mermaid diagram against the Bayesian network it was drawn from. Verify that:
1. Every node of the network appears as a labeled node in the diagram
2. Every parent-child edge of the network appears as an arrow in the diagram
3. The diagram has no edge that the network does not contain

If anything is wrong, list each missing or extra node and edge and how to fix it.
If the diagram is complete, reply starting with: "{sentence}"

BAYESIAN NETWORK DESCRIPTION:
{network}

MERMAID DIAGRAM:
{diagram}"#
    )
}

pub fn diagram_correction_prompt(network: &str, rejected: &str, defects: &str, header: &str) -> String {
    format!(
        "Redraw the Mermaid flowchart so that it fixes every problem in the review feedback.\n\n\
REVIEW FEEDBACK:\n{}\n\nPREVIOUS DIAGRAM:\n{}\n\nBAYESIAN NETWORK DESCRIPTION:\n{}\n\n{}",
        defects,
        rejected,
        network,
        diagram_rules(header)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan_input() -> UserInput {
        UserInput::from_raw(Some("{\"age\":30}"), Some("loan approval")).unwrap()
    }

    #[test]
    fn test_synthesis_prompt_embeds_inputs() {
        let prompt = synthesis_prompt(&loan_input());
        assert!(prompt.contains("SITUATION DESCRIPTION:\nloan approval"));
        assert!(prompt.contains("\"age\": 30"));
        assert!(prompt.contains("Conditional Probability Table"));
    }

    #[test]
    fn test_audit_prompt_carries_sentinel_and_network() {
        let prompt = network_audit_prompt("Nodes: Age, Loan", "VALID");
        assert!(prompt.contains(
            "\"VALID: All CPTs, states, and connections present and explicit for every node.\""
        ));
        assert!(prompt.ends_with("Nodes: Age, Loan"));
    }

    #[test]
    fn test_audit_prompts_ask_for_configured_prefix() {
        let prompt = network_audit_prompt("Nodes: Age, Loan", "COMPLETE");
        assert!(prompt.contains(&network_valid_sentence("COMPLETE")));
        assert!(!prompt.contains("VALID:"));

        let prompt = diagram_audit_prompt("[Age] -> [Risk]", "flowchart TD", "COMPLETE");
        assert!(prompt.contains("reply starting with: \"COMPLETE: Every node"));
        assert!(!prompt.contains("VALID:"));
    }

    #[test]
    fn test_correction_prompt_embeds_defects_verbatim() {
        let defects = "Node Risk: CPT missing for Income=Low";
        let prompt = network_correction_prompt(&loan_input(), defects);
        assert!(prompt.contains(defects));
        assert!(prompt.contains("loan approval"));
        // 修正提示不應與其他階段的開頭混淆
        assert!(!prompt.contains("cognitive modeler"));
        assert!(!prompt.contains("strictly audit"));
    }

    #[test]
    fn test_diagram_prompts_use_header() {
        let prompt = diagram_prompt("A -> B", "flowchart TD");
        assert!(prompt.contains("starting with \"flowchart TD\""));
        assert!(prompt.contains("A -> B"));

        let fix = diagram_correction_prompt("A -> B", "flowchart TD\nA", "edge A->B missing", "graph LR");
        assert!(fix.contains("edge A->B missing"));
        assert!(fix.contains("exactly \"graph LR\""));
        assert!(!fix.contains("Convert the following"));
    }

    #[test]
    fn test_diagram_audit_prompt_embeds_both_artifacts() {
        let prompt = diagram_audit_prompt("[Age] -> [Risk]", "flowchart TD\nAge --> Risk", "VALID");
        assert!(prompt.contains("[Age] -> [Risk]"));
        assert!(prompt.contains("Age --> Risk"));
        assert!(prompt.contains(&diagram_valid_sentence("VALID")));
    }
}
