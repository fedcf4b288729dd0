use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Password, Text};
use std::path::PathBuf;

use gdash_core::{
    ApiClient, AvatarFile, Config, Dashboard, GenerateOutcome, PeopleClient, RegisterPayload,
    Session, SessionStore, WeatherLog,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "gdash", version, about = "Weather dashboard CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the backend base URL and defaults.
    Configure,

    /// Sign in and store the session token.
    Login,

    /// Create an account and sign in.
    Register {
        /// Avatar image to upload with the registration.
        #[arg(long)]
        avatar: Option<PathBuf>,
    },

    /// Drop the local session and notify the backend.
    Logout,

    /// Collect weather for a city, wait for the AI insight and render the
    /// dashboard.
    Dashboard {
        /// City to collect; defaults to the configured one.
        city: Option<String>,

        /// Lookback window in days for the insight.
        #[arg(long)]
        days: Option<u32>,
    },

    /// Browse the historical weather log pages.
    Logs {
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Filter by city.
        #[arg(long)]
        city: Option<String>,
    },

    /// List recent AI insights.
    Insights {
        #[arg(long)]
        days: Option<u32>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Download the logs as a report file.
    Export {
        #[arg(value_enum)]
        format: ExportFormat,

        /// Destination path; defaults to the backend-suggested filename.
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long, default_value_t = 100)]
        limit: u32,
    },

    /// List Star Wars characters from the public API.
    People {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;
        let store = SessionStore::open()?;
        let session = store.load()?;
        let client = ApiClient::from_config(&config, session.as_ref());

        match self.command {
            Command::Configure => configure(config),
            Command::Login => login(&client, &store).await,
            Command::Register { avatar } => register(&client, &store, avatar).await,
            Command::Logout => logout(&client, &store).await,
            Command::Dashboard { city, days } => dashboard(client, &config, city, days).await,
            Command::Logs { page, city } => logs(&client, &config, page, city).await,
            Command::Insights { days, city, page } => {
                insights(&client, &config, days, city, page).await
            }
            Command::Export { format, out, limit } => export(&client, format, out, limit).await,
            Command::People { page } => people(&config, page).await,
        }
    }
}

fn configure(config: Config) -> Result<()> {
    let base_url = Text::new("Backend base URL:").with_default(&config.base_url).prompt()?;
    let default_city = Text::new("Default city:").with_default(&config.default_city).prompt()?;

    let updated = Config { base_url, default_city, ..config };
    updated.save()?;

    println!("Configuration saved to {}.", Config::config_file_path()?.display());
    Ok(())
}

async fn login(client: &ApiClient, store: &SessionStore) -> Result<()> {
    let email = Text::new("Email:").prompt()?;
    let password = Password::new("Password:").without_confirmation().prompt()?;

    let auth = client.login(&email, &password).await?;
    store.save(&Session { token: auth.token, user: auth.user.clone() })?;

    println!("Signed in as {} <{}>.", auth.user.username, auth.user.email);
    Ok(())
}

async fn register(
    client: &ApiClient,
    store: &SessionStore,
    avatar: Option<PathBuf>,
) -> Result<()> {
    let username = Text::new("Username:").prompt()?;
    let email = Text::new("Email:").prompt()?;
    // The confirmation prompt doubles as the backend's `password2` field.
    let password = Password::new("Password:").prompt()?;

    let avatar = match avatar {
        Some(path) => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read avatar file: {}", path.display()))?;
            let filename =
                path.file_name().and_then(|n| n.to_str()).unwrap_or("avatar").to_string();
            Some(AvatarFile { filename, bytes })
        }
        None => None,
    };

    let payload = RegisterPayload {
        username,
        email,
        password: password.clone(),
        password2: password,
        avatar,
    };

    let auth = client.register(&payload).await?;
    store.save(&Session { token: auth.token, user: auth.user.clone() })?;

    if !auth.message.is_empty() {
        println!("{}", auth.message);
    }
    println!("Signed in as {} <{}>.", auth.user.username, auth.user.email);
    Ok(())
}

async fn logout(client: &ApiClient, store: &SessionStore) -> Result<()> {
    store.clear()?;
    // Server-side invalidation is best-effort once the local session is gone.
    client.logout().await;
    println!("Signed out.");
    Ok(())
}

async fn dashboard(
    client: ApiClient,
    config: &Config,
    city: Option<String>,
    days: Option<u32>,
) -> Result<()> {
    let city = city.unwrap_or_else(|| config.default_city.clone());
    let mut dash = Dashboard::new(Box::new(client), config);
    if let Some(days) = days {
        dash.set_days(days);
    }

    tracing::debug!(city = %city, days = dash.days(), "collect-and-generate issued");
    println!("Collecting weather and generating insight for {city}...");
    let outcome = dash.generate_for_city(&city).await?;

    render_summary(dash.current_log());
    render_chart(&dash.chart_points());
    render_insight(dash.insight_text());
    render_logs_table(dash.logs());
    render_pager(dash.page(), dash.total_count(), dash.has_previous(), dash.has_next());

    match outcome {
        GenerateOutcome::Fresh(_) => println!("\nWeather and AI insight updated for {city}."),
        GenerateOutcome::TimedOut => println!(
            "\nWeather collected for {city}; the AI insight is still being generated, the previous one is shown."
        ),
    }
    Ok(())
}

async fn logs(
    client: &ApiClient,
    config: &Config,
    page: u32,
    city: Option<String>,
) -> Result<()> {
    let page = page.max(1);
    let offset = (page - 1) * config.page_size;
    let data = client.list_logs(config.page_size, offset, city.as_deref()).await?;

    if data.results.is_empty() {
        println!("No weather logs yet.");
        return Ok(());
    }

    render_logs_table(&data.results);
    render_pager(page, data.count, data.previous.is_some(), data.next.is_some());
    Ok(())
}

async fn insights(
    client: &ApiClient,
    config: &Config,
    days: Option<u32>,
    city: Option<String>,
    page: u32,
) -> Result<()> {
    let page = page.max(1);
    let offset = (page - 1) * config.page_size;
    let data =
        client.list_insights(days, config.page_size, offset, city.as_deref()).await?;

    if data.results.is_empty() {
        println!("Ainda não há dados suficientes para gerar insights climáticos.");
        return Ok(());
    }

    for insight in &data.results {
        println!("#{}  {}", insight.id, insight.generated_at.format("%d/%m/%Y %H:%M"));
        println!("{}\n", insight.text);
    }
    render_pager(page, data.count, data.previous.is_some(), data.next.is_some());
    Ok(())
}

async fn export(
    client: &ApiClient,
    format: ExportFormat,
    out: Option<PathBuf>,
    limit: u32,
) -> Result<()> {
    let blob = match format {
        ExportFormat::Csv => client.export_csv(limit, 0).await?,
        ExportFormat::Xlsx => client.export_xlsx(limit, 0).await?,
    };

    let path = out.unwrap_or_else(|| PathBuf::from(&blob.filename));
    std::fs::write(&path, &blob.bytes)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;

    println!("Saved {} bytes to {}.", blob.bytes.len(), path.display());
    Ok(())
}

async fn people(config: &Config, page: u32) -> Result<()> {
    let client = PeopleClient::new(config.people_base_url.clone());
    let data = client.list_people(page.max(1)).await?;

    println!(
        "{:<24} {:<10} {:<11} {:>7} {:>7}",
        "Name", "Gender", "Birth year", "Height", "Mass"
    );
    for person in &data.results {
        println!(
            "{:<24} {:<10} {:<11} {:>7} {:>7}",
            person.name, person.gender, person.birth_year, person.height, person.mass
        );
    }

    println!("\n{} characters total.", data.count);
    if data.next.is_some() {
        println!("More on --page {}.", page + 1);
    }
    Ok(())
}

fn render_summary(log: Option<&WeatherLog>) {
    println!();
    match log {
        Some(log) => {
            println!("{} | {}", log.city, log.timestamp.format("%d/%m/%Y %H:%M"));
            println!(
                "{:.1} °C, {} | humidity {:.0} % | pressure {:.1} hPa | wind {:.1} m/s",
                log.temperature, log.condition, log.humidity, log.pressure, log.wind_speed
            );
        }
        None => println!("No weather data collected yet."),
    }
}

fn render_chart(points: &[(chrono::DateTime<chrono::Utc>, f64)]) {
    if points.len() < 2 {
        return;
    }

    let min = points.iter().map(|(_, t)| *t).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|(_, t)| *t).fold(f64::NEG_INFINITY, f64::max);
    let span = (max - min).max(0.1);

    println!("\nTemperature");
    for (timestamp, temp) in points {
        let width = (((temp - min) / span) * 30.0).round() as usize;
        println!("{}  {:>5.1} °C  {}", timestamp.format("%d/%m %H:%M"), temp, "▇".repeat(width + 1));
    }
}

fn render_insight(text: &str) {
    println!("\nAI insight");
    if text.trim().is_empty() {
        println!("Ainda não há dados suficientes para gerar insights climáticos.");
    } else {
        println!("{text}");
    }
}

fn render_logs_table(logs: &[WeatherLog]) {
    println!(
        "\n{:<12} {:<14} {:<20} {:>9} {:>9} {:>10} {:>7}",
        "Date/time", "City", "Condition", "Temp °C", "Hum. %", "Pres. hPa", "Wind"
    );
    for log in logs {
        println!(
            "{:<12} {:<14} {:<20} {:>9.1} {:>9.0} {:>10.1} {:>7.1}",
            log.timestamp.format("%d/%m %H:%M").to_string(),
            log.city,
            log.condition,
            log.temperature,
            log.humidity,
            log.pressure,
            log.wind_speed
        );
    }
}

fn render_pager(page: u32, count: u64, has_previous: bool, has_next: bool) {
    let mut hints = Vec::new();
    if has_previous {
        hints.push(format!("previous: --page {}", page - 1));
    }
    if has_next {
        hints.push(format!("next: --page {}", page + 1));
    }

    if hints.is_empty() {
        println!("\nPage {page}, {count} records.");
    } else {
        println!("\nPage {page}, {count} records ({}).", hints.join(", "));
    }
}
