use clap::{Parser, Subcommand};
use hotspot_pay::application::controller::{PaymentFlowController, PurchaseOutcome};
use hotspot_pay::config::{DEFAULT_API_URL, DEFAULT_LOGIN_URL, FlowSettings, PortalConfig};
use hotspot_pay::domain::ports::{HotspotLoginBox, PortalGatewayBox, PortalViewRef};
use hotspot_pay::infrastructure::hotspot_login::HttpHotspotLogin;
use hotspot_pay::infrastructure::http::HttpPortalGateway;
use hotspot_pay::interfaces::terminal::TerminalView;
use miette::{IntoDiagnostic, Result, miette};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about = "Buy hotspot internet access with M-Pesa", long_about = None)]
struct Cli {
    /// Base URL of the hotspot billing API
    #[arg(long, env = "HOTSPOT_PAY_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Hotspot login form action on the router
    #[arg(long, env = "HOTSPOT_PAY_LOGIN_URL", default_value = DEFAULT_LOGIN_URL)]
    login_url: String,

    /// Seconds between payment status checks
    #[arg(long, default_value_t = 5)]
    poll_interval_secs: u64,

    /// Status checks before giving up on a payment
    #[arg(long, default_value_t = 60)]
    max_poll_attempts: u32,

    /// Seconds a status message stays on screen
    #[arg(long, default_value_t = 5)]
    status_display_secs: u64,

    /// Seconds to wait after showing credentials before logging in
    #[arg(long, default_value_t = 5)]
    auto_login_delay_secs: u64,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the packages on sale
    Plans,
    /// Pay for a package and log in with the issued credentials
    Buy {
        /// Package id as shown by `plans`
        #[arg(long = "package")]
        package_id: u64,

        /// M-Pesa number in the form +254XXXXXXXXX
        #[arg(long)]
        phone: String,

        /// Print the credentials instead of submitting the login form
        #[arg(long)]
        no_login: bool,
    },
}

impl Cli {
    fn config(&self) -> PortalConfig {
        let auto_login = !matches!(self.command, Command::Buy { no_login: true, .. });
        PortalConfig {
            api_url: self.api_url.clone(),
            login_url: self.login_url.clone(),
            http_timeout: Duration::from_secs(self.timeout_secs),
            flow: FlowSettings {
                poll_interval: Duration::from_secs(self.poll_interval_secs),
                max_poll_attempts: self.max_poll_attempts,
                status_display: Duration::from_secs(self.status_display_secs),
                auto_login_delay: Duration::from_secs(self.auto_login_delay_secs),
                auto_login,
            },
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config();
    config.validate().into_diagnostic()?;

    let gateway: PortalGatewayBox = Box::new(
        HttpPortalGateway::new(&config.api_url, config.http_timeout).into_diagnostic()?,
    );
    let login: HotspotLoginBox = Box::new(
        HttpHotspotLogin::new(&config.login_url, config.http_timeout).into_diagnostic()?,
    );
    let view: PortalViewRef = Arc::new(TerminalView::new(io::stdout()));
    let flow = PaymentFlowController::new(gateway, login, view, config.flow);

    match cli.command {
        Command::Plans => {
            flow.load_packages().await.into_diagnostic()?;
            Ok(())
        }
        Command::Buy {
            package_id, phone, ..
        } => match flow.initiate_payment(package_id, &phone).await.into_diagnostic()? {
            PurchaseOutcome::Connected(credentials) => {
                println!("Logged in as {}", credentials.username);
                Ok(())
            }
            PurchaseOutcome::Issued(credentials) => {
                println!("Username: {}", credentials.username);
                println!("Password: {}", credentials.password);
                Ok(())
            }
            PurchaseOutcome::InvalidPhone => Err(miette!("invalid phone number {phone:?}")),
            PurchaseOutcome::Rejected(reason) => Err(miette!("payment rejected: {reason}")),
            PurchaseOutcome::Failed => Err(miette!("payment failed")),
            PurchaseOutcome::PaidWithoutCredentials => Err(miette!(
                "payment received but no credentials were issued; do not pay again"
            )),
            PurchaseOutcome::TimedOut => Err(miette!("payment confirmation timed out")),
        },
    }
}
