//! `vault demo` -- one scripted pass through the whole workflow.

use tracing::info;
use vault_workflow::{SessionPhase, UploadForm, WorkflowEngine};

use crate::render;
use crate::OutputFormat;

pub struct DemoArgs {
    pub name: String,
    pub value: String,
    pub confidence: String,
    pub description: String,
}

/// Connect, upload one record, then decrypt and verify it.
///
/// Returns the process exit code.
pub async fn run(engine: &WorkflowEngine, wallet: &str, args: DemoArgs, output: OutputFormat) -> i32 {
    engine.connect(wallet).await;
    if engine.phase() != SessionPhase::Ready {
        return fail(engine, "connect");
    }
    step(output, &format!("connected {wallet}"));

    engine.open_upload();
    engine.set_upload_form(UploadForm::new(
        args.name,
        &args.value,
        args.confidence,
        args.description,
    ));
    let id = match engine.upload().await {
        Ok(id) => id,
        Err(_) => return fail(engine, "upload"),
    };
    step(output, &format!("uploaded {id}"));

    let Some(value) = engine.decrypt(&id).await else {
        return fail(engine, "decrypt");
    };
    step(output, &format!("decrypted {id}: {value}"));
    info!(record = %id, value, "demo complete");

    match output {
        OutputFormat::Json => println!("{}", render::json(&engine.snapshot())),
        OutputFormat::Text => {
            for record in engine.records() {
                let display = engine.value_display(&record.id);
                println!("{}", render::record_line(&record, display));
            }
            println!("{}", render::stats(&engine.stats()));
        }
    }
    0
}

fn step(output: OutputFormat, message: &str) {
    if output == OutputFormat::Text {
        println!("{message}");
    }
}

fn fail(engine: &WorkflowEngine, stage: &str) -> i32 {
    let status = engine.status();
    let reason = if status.message.is_empty() {
        "unknown error"
    } else {
        status.message.as_str()
    };
    eprintln!("error: {stage} failed: {reason}");
    1
}
