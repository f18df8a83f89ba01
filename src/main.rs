use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use rodcheck::{
    classify_email, server, AppState, ArtifactStore, Classifier, Config, ModelArtifact,
    PredictionService, Store,
};
use rodcheck::auth::AuthKeys;

#[derive(Parser)]
#[command(author, version, about = "Phishing email classifier service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Address to bind, e.g. 0.0.0.0:5000
        #[arg(long)]
        listen: Option<SocketAddr>,
        /// Directory containing model.onnx and tokenizer.json
        #[arg(long)]
        model_dir: Option<PathBuf>,
        /// Disable per-user prediction logging
        #[arg(long)]
        no_prediction_log: bool,
    },
    /// Classify a single email body and print the label
    Check {
        /// Email body text
        text: String,
        /// Directory containing model.onnx and tokenizer.json
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
    /// Download and verify the model artifacts
    Fetch {
        /// Force a fresh download of the model files
        #[arg(short, long)]
        fresh: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            listen,
            model_dir,
            no_prediction_log,
        } => serve(listen, model_dir, no_prediction_log).await,
        Command::Check { text, model_dir } => check(&text, model_dir),
        Command::Fetch { fresh } => fetch(fresh).await,
    }
}

/// Loads the classifier once; a load failure here is fatal before the
/// server ever binds.
fn build_classifier(model_dir: Option<PathBuf>) -> anyhow::Result<Classifier> {
    let artifact = ModelArtifact::distilbert_phishing();

    let builder = match model_dir {
        Some(dir) => {
            let model_path = dir.join("model.onnx");
            let tokenizer_path = dir.join("tokenizer.json");
            Classifier::builder().with_model_files(
                &model_path.to_string_lossy(),
                &tokenizer_path.to_string_lossy(),
                Some(artifact.max_sequence_length),
            )
        }
        None => {
            let store = ArtifactStore::new_default()
                .context("failed to open the local artifact store")?;
            if !store.is_present(&artifact) {
                anyhow::bail!(
                    "model artifacts not found in {}; run `rodcheck fetch` or pass --model-dir",
                    ArtifactStore::default_models_dir().display()
                );
            }
            Classifier::builder().with_artifact(&store, &artifact)
        }
    };

    let classifier = builder
        .context("failed to load the model artifact")?
        .build()
        .context("failed to build the classifier")?;

    let classifier_info = classifier.info();
    info!(
        "classifier ready: model {}, window {} tokens",
        classifier_info.model_path, classifier_info.max_sequence_length
    );
    Ok(classifier)
}

async fn serve(
    listen: Option<SocketAddr>,
    model_dir: Option<PathBuf>,
    no_prediction_log: bool,
) -> anyhow::Result<()> {
    let mut config = Config::from_env();
    if let Some(listen) = listen {
        config.listen_addr = listen;
    }
    if let Some(dir) = model_dir {
        config.model_dir = Some(dir);
    }
    if no_prediction_log {
        config.log_predictions = false;
    }

    let classifier = build_classifier(config.model_dir.clone())?;

    let store = Store::new();
    let auth = AuthKeys::new(config.jwt_secret.as_bytes());
    let service = PredictionService::new(Arc::new(classifier), store.clone(), config.log_predictions);
    let app = server::router(
        AppState {
            service,
            store,
            auth,
        },
        &config.cors_origin,
    )
    .with_context(|| format!("invalid CORS origin '{}'", config.cors_origin))?;

    info!("listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn check(text: &str, model_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let classifier = build_classifier(model_dir)?;
    let prediction = classify_email(&classifier, text)?;

    println!("{}", prediction.label);
    println!(
        "logits: legit {:.4}, phishing {:.4}",
        prediction.logits[0], prediction.logits[1]
    );
    Ok(())
}

async fn fetch(fresh: bool) -> anyhow::Result<()> {
    let store = ArtifactStore::new_default().context("failed to open the local artifact store")?;
    let artifact = ModelArtifact::distilbert_phishing();

    if fresh {
        info!("fresh download requested, removing any existing artifact files");
        store.remove(&artifact)?;
    }
    store.ensure_present(&artifact).await?;

    println!(
        "model artifacts ready at {}",
        store.model_path(&artifact).display()
    );
    Ok(())
}
