use rpbridge_core::{
    events, get_config, Client, Config, ConsoleFormatter, ErrorFormatter, LaunchSettings,
    ReportPortalReporter, Reporter, Session,
};
use tokio::task::JoinHandle;
use tracing::*;
use tracing_subscriber::EnvFilter;

/// Install the `RUST_LOG` driven log subscriber and colored error reports.
/// Calling it more than once is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rpbridge=info,rpbridge_core=info,warn"));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        debug!("log subscriber already installed: {e}");
    }
    if let Err(e) = color_eyre::install() {
        debug!("error report handler already installed: {e}");
    }
}

/// rpbridge application: connects to ReportPortal and reports every
/// lifecycle event published on [`events`].
pub struct App<C> {
    config: Config,
    client: C,
    formatter: Box<dyn ErrorFormatter>,
}

impl<C: Client + 'static> App<C> {
    /// Use the process-wide configuration.
    pub fn new(client: C) -> App<C> {
        App::with_config(get_config().clone(), client)
    }

    pub fn with_config(config: Config, client: C) -> App<C> {
        App {
            config,
            client,
            formatter: Box::new(ConsoleFormatter),
        }
    }

    /// Replace the formatter used to render test errors.
    pub fn formatter(mut self, formatter: impl ErrorFormatter + 'static) -> App<C> {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the connectivity check and build the reporter.
    pub async fn connect(self) -> ReportPortalReporter<C> {
        let App {
            config,
            client,
            formatter,
        } = self;
        if let Ok(endpoint) = config.endpoint() {
            info!("reporting to {endpoint}");
        }
        let session = Session::connect(LaunchSettings::from(&config), client).await;
        ReportPortalReporter::new(session, formatter)
    }

    /// Connect and report events until the channel is closed.
    pub async fn run(self) -> eyre::Result<()> {
        init_logging();
        let mut reporter = self.connect().await;
        reporter.run().await
    }

    /// Connect, subscribe, and report in a background task.
    ///
    /// Events published after this returns are guaranteed to be seen.
    pub async fn start(self) -> eyre::Result<JoinHandle<eyre::Result<()>>> {
        init_logging();
        let mut reporter = self.connect().await;
        let rx = events::subscribe()?;
        Ok(tokio::spawn(async move { reporter.run_with(rx).await }))
    }
}
