use anyhow::Context;
use bayes_mermaid::core::correction::CorrectionTrace;
use bayes_mermaid::core::UserInput;
use bayes_mermaid::utils::error::ErrorCategory;
use bayes_mermaid::utils::{logger, validation::Validate};
use bayes_mermaid::{AppState, ServiceConfig, ServiceError};
use clap::Parser;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "bayes-run")]
#[command(about = "Generate a Bayesian network and Mermaid diagram once, without the HTTP server")]
struct Args {
    /// Path to the JSON data file
    #[arg(short, long)]
    json_file: String,

    /// Situation description
    #[arg(short, long)]
    situation: String,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Stop after the network stage
    #[arg(long)]
    skip_diagram: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn exit_code(e: &ServiceError) -> i32 {
    match e.category() {
        ErrorCategory::Upstream => 2,
        _ => 1,
    }
}

fn fail(e: ServiceError) -> ! {
    tracing::error!("❌ {}", e);
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(&e));
}

/// 失敗時仍保留已產生的結果，並附上錯誤與建議
fn failure_output(
    mut output: Value,
    e: &ServiceError,
    artifact_key: &str,
    verdict_key: &str,
    trace: CorrectionTrace,
) -> Value {
    output["error"] = Value::String(e.to_string());
    output["suggestion"] = Value::String(e.recovery_suggestion());
    if let Some(artifact) = trace.artifact {
        output[artifact_key] = Value::String(artifact);
    }
    if let Some(verdict) = trace.verdict {
        output[verdict_key] = Value::String(verdict);
    }
    output
}

fn print_json(output: &Value) {
    match serde_json::to_string_pretty(output) {
        Ok(text) => println!("{}", text),
        Err(e) => tracing::error!("Failed to serialize output: {}", e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match ServiceConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                logger::init_cli_logger(args.verbose);
                fail(e);
            }
        },
        None => ServiceConfig::default(),
    };

    logger::init_logger(args.verbose || config.logging.verbose, config.logging.json);

    if let Err(e) = config.validate() {
        fail(e);
    }

    let json_text = std::fs::read_to_string(&args.json_file)
        .with_context(|| format!("failed to read JSON file '{}'", args.json_file))?;

    // 與 HTTP 端點相同的輸入驗證
    let input = UserInput::from_raw(Some(json_text.as_str()), Some(args.situation.as_str()))
        .unwrap_or_else(|e| fail(e));

    let state = AppState::from_config(&config);

    let mut trace = CorrectionTrace::default();
    let result = state.network.run(&input, &mut trace).await;
    let network = match result {
        Ok(network) => network,
        Err(e) => {
            print_json(&failure_output(json!({}), &e, "bayesNet", "judgeVerdict", trace));
            fail(e);
        }
    };

    let mut output = json!({
        "bayesNet": network.artifact.clone(),
        "judgeVerdict": network.verdict.text,
    });

    if !args.skip_diagram {
        let mut trace = CorrectionTrace::default();
        let result = state.diagram.run(&network.artifact, &mut trace).await;
        let diagram = match result {
            Ok(diagram) => diagram,
            Err(e) => {
                print_json(&failure_output(output, &e, "mermaidCode", "diagramVerdict", trace));
                fail(e);
            }
        };
        output["mermaidCode"] = Value::String(diagram.diagram);
        output["diagramVerdict"] = diagram
            .verdict
            .map(|v| Value::String(v.text))
            .unwrap_or(Value::Null);
    }

    print_json(&output);
    Ok(())
}
