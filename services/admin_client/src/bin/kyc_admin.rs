//! services/admin_client/src/bin/kyc_admin.rs

use admin_client_lib::{
    config::Config,
    error::ClientError,
    review::DecisionForm,
    session::SignupForm,
    web::{AppState, Navigation},
};
use clap::{Parser, Subcommand, ValueEnum};
use kyc_session_core::domain::{Decision, Location, LoginCredentials, TokenFreshness};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "kyc-admin", version, about = "Admin session client for the KYC review backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session locally.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "KYC_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create a new admin account.
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "KYC_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        bank_name: String,
        #[arg(long, default_value = "admin")]
        role: String,
    },
    /// End the session locally and on the backend.
    Logout,
    /// Show local and backend session validity.
    Status,
    /// Navigate to a path through the route guards.
    Open {
        path: String,
        /// Where the admin was headed before being sent here.
        #[arg(long)]
        from: Option<String>,
    },
    /// Upload a customer document.
    Upload {
        #[arg(long)]
        customer_id: String,
        file: PathBuf,
    },
    /// List analyses waiting for a decision.
    Pending,
    /// List decisions already made by this admin.
    History,
    /// Show the risk analysis results for one customer.
    Results {
        #[arg(long)]
        customer_id: String,
    },
    /// Record a decision on a customer's risk analysis.
    Decide {
        #[arg(long)]
        customer_id: String,
        #[arg(long, value_enum)]
        decision: Verdict,
        #[arg(long)]
        feedback: String,
        #[arg(long)]
        ml_result_id: Option<String>,
        #[arg(long)]
        risk_override: Option<String>,
        #[arg(long)]
        override_reason: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Verdict {
    Approve,
    Reject,
    Feedback,
}

impl From<Verdict> for Decision {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Approve => Decision::Approved,
            Verdict::Reject => Decision::Rejected,
            Verdict::Feedback => Decision::FeedbackProvided,
        }
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), ClientError> {
    let pretty = serde_json::to_string_pretty(value).map_err(|e| ClientError::Internal(e.to_string()))?;
    println!("{}", pretty);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Session file: {}", config.session_path.display());

    // --- 2. Build the Shared AppState ---
    let state = AppState::init(config)?;

    // --- 3. Run the Command ---
    let result = run(&state, cli.command).await;
    state.shutdown().await;
    result
}

async fn run(state: &AppState, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Login { username, password } => {
            let outcome = state
                .context
                .login(&LoginCredentials { username, password })
                .await;
            match (outcome.success, outcome.admin) {
                (true, Some(admin)) => println!("Logged in as {} ({})", admin.full_name, admin.bank_name),
                _ => {
                    let message = outcome.error.unwrap_or_else(|| "Login failed".to_string());
                    return Err(ClientError::Internal(message));
                }
            }
        }
        Command::Signup {
            username,
            email,
            password,
            confirm_password,
            full_name,
            bank_name,
            role,
        } => {
            let form = SignupForm {
                username,
                email,
                password,
                confirm_password,
                full_name,
                bank_name,
                role,
            };
            state
                .facade
                .signup(&form)
                .await
                .map_err(ClientError::Internal)?;
            println!("Account created. Log in with `kyc-admin login`.");
        }
        Command::Logout => {
            state.context.logout().await;
            println!("Logged out");
        }
        Command::Status => {
            state.context.initialize().await;
            let auth = state.context.state();
            match &auth.admin {
                Some(admin) if auth.is_authenticated => {
                    println!("Signed in as {} <{}>, role {}", admin.username, admin.email, admin.role)
                }
                _ => println!("Not signed in"),
            }
            if let Some(error) = &auth.error {
                println!("Last error: {}", error);
            }
            match state.facade.refresh_token_if_needed() {
                TokenFreshness::ExpiringSoon { seconds_left } => {
                    println!("Token expires in {}s", seconds_left.max(0))
                }
                TokenFreshness::Unreadable => println!("Stored token could not be read"),
                TokenFreshness::Fresh | TokenFreshness::Missing => {}
            }
        }
        Command::Open { path, from } => {
            let target = match from {
                Some(from) => Location::with_from(path, Location::new(from)),
                None => Location::new(path),
            };
            match state.router.navigate(target).await {
                Navigation::Rendered { location, redirects } => {
                    print!("{}", location.pathname);
                    if let Some(from) = location.from_pathname() {
                        print!(" (from {})", from);
                    }
                    println!(" after {} redirect(s)", redirects);
                }
                Navigation::Superseded => println!("Navigation superseded"),
                Navigation::RedirectLoop { last } => {
                    return Err(ClientError::Internal(format!(
                        "Redirect loop, gave up at {}",
                        last.pathname
                    )));
                }
            }
        }
        Command::Upload { customer_id, file } => {
            let bytes = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string());
            let response = state
                .api
                .upload_document(&customer_id, &file_name, bytes)
                .await
                .map_err(|e| ClientError::Internal(e.message))?;
            print_json(&response)?;
        }
        Command::Pending => {
            let pending = state
                .api
                .pending_decisions()
                .await
                .map_err(|e| ClientError::Internal(e.message))?;
            print_json(&pending)?;
        }
        Command::History => {
            let decisions = state
                .api
                .my_decisions()
                .await
                .map_err(|e| ClientError::Internal(e.message))?;
            print_json(&decisions)?;
        }
        Command::Results { customer_id } => {
            let results = state
                .api
                .ml_results(&customer_id)
                .await
                .map_err(|e| ClientError::Internal(e.message))?;
            print_json(&results)?;
        }
        Command::Decide {
            customer_id,
            decision,
            feedback,
            ml_result_id,
            risk_override,
            override_reason,
        } => {
            let form = DecisionForm {
                customer_id,
                ml_result_id,
                decision: decision.into(),
                feedback,
                risk_override,
                override_reason,
            };
            state
                .api
                .submit_decision(&form)
                .await
                .map_err(|e| ClientError::Internal(e.message))?;
            println!("Decision {:?} recorded for {}", form.decision, form.customer_id.trim());
        }
    }
    Ok(())
}
