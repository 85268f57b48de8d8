use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use flat3d::api::{load_profile_pic, ApiClient, ApiError, ListingSource, SignupForm, StaticListings};
use flat3d::bookings::{card_date, sample_bookings, BookingsScreen};
use flat3d::config::AppConfig;
use flat3d::filter::{Category, ListingScreen};
use flat3d::host::{HeadlessHost, HostOptions};
use flat3d::models::Property;
use flat3d::session::{SessionContext, SessionStore};
use flat3d::viewer::{model_url, ModelViewer, Surface, ViewerState, PLACEHOLDER_TEXT};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flat3d", version, about = "Browse 3dflat listings and their 3D models")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List properties, optionally searched and filtered
    List {
        /// Case-insensitive search over name and location
        #[arg(short, long, default_value = "")]
        query: String,
        /// Category chip to tap (Place, Villa, Type, Bedroom); repeat to toggle
        #[arg(short, long)]
        category: Vec<String>,
        /// Read listings from a saved JSON snapshot instead of the backend
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Print each visible property as a one-line JSON snapshot
        #[arg(long)]
        json: bool,
    },
    /// Show one property's details
    Show {
        #[command(flatten)]
        target: Target,
    },
    /// Load a property's 3D model in headless Chrome and relay its messages
    View {
        #[command(flatten)]
        target: Target,
        /// Seconds to watch the viewer before tearing it down
        #[arg(long, default_value_t = 10)]
        watch: u64,
        /// Save a PNG of the rendered scene
        #[arg(long)]
        screenshot: Option<PathBuf>,
    },
    /// Check whether an account exists for an email
    CheckEmail { email: String },
    /// Log in and store the session
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and store the session
    Signup {
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        contact_number: String,
        #[arg(long)]
        profile_pic: Option<PathBuf>,
    },
    /// Clear the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List the signed-in user's likes
    Likes,
    /// Like a property
    Like { id: i64 },
    /// Show bookings
    Bookings,
}

/// Which property a detail command is about
#[derive(clap::Args)]
struct Target {
    /// Property id, looked up in the fetched listings
    #[arg(required_unless_present = "property")]
    id: Option<i64>,
    /// Property snapshot as printed by `flat3d list --json`
    #[arg(long, conflicts_with = "id")]
    property: Option<String>,
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let mut session = SessionContext::load(SessionStore::new(&config.data_dir))?;
    info!("Starting at {:?} route", session.initial_route());

    match cli.command {
        Command::List {
            query,
            category,
            snapshot,
            json,
        } => list(&config, &query, &category, snapshot, json).await,
        Command::Show { target } => show(&config, target).await,
        Command::View {
            target,
            watch,
            screenshot,
        } => view(&config, target, watch, screenshot).await,
        Command::CheckEmail { email } => {
            let client = ApiClient::new(config).map_err(alert)?;
            if client.check_email(&email).await.map_err(alert)? {
                println!("{} has an account, log in with `flat3d login`", email);
            } else {
                println!("No account for {}, sign up with `flat3d signup`", email);
            }
            Ok(())
        }
        Command::Login { email, password } => {
            let client = ApiClient::new(config).map_err(alert)?;
            let user = client.login(&email, &password).await.map_err(alert)?;
            session.sign_in(user)?;
            println!("Welcome back!");
            Ok(())
        }
        Command::Signup {
            email,
            password,
            contact_number,
            profile_pic,
        } => {
            let profile_pic = profile_pic
                .as_deref()
                .map(load_profile_pic)
                .transpose()
                .map_err(alert)?;
            let client = ApiClient::new(config).map_err(alert)?;
            let user = client
                .signup(SignupForm {
                    email,
                    password,
                    contact_number,
                    profile_pic,
                })
                .await
                .map_err(alert)?;
            session.sign_in(user)?;
            println!("Account created");
            Ok(())
        }
        Command::Logout => {
            session.clear()?;
            println!("Logged out");
            Ok(())
        }
        Command::Whoami => {
            match session.user() {
                Some(user) => {
                    println!("Hi {}!", user.display_name());
                    if let Some(pic) = user.profile.as_ref().and_then(|p| p.profile_pic.as_ref()) {
                        println!("Profile Pic URL: {}", pic);
                    }
                }
                None => println!("Not logged in"),
            }
            Ok(())
        }
        Command::Likes => {
            let email = signed_in_email(&session)?;
            let client = ApiClient::new(config).map_err(alert)?;
            let likes = client.likes(&email).await.map_err(alert)?;
            if likes.is_empty() {
                println!("No likes yet");
            }
            for like in likes {
                println!("{}  liked {}", like.created_at.format("%Y-%m-%d"), like.liked_item_id);
            }
            Ok(())
        }
        Command::Like { id } => {
            let email = signed_in_email(&session)?;
            let client = ApiClient::new(config).map_err(alert)?;
            let outcome = client.like(&email, &id.to_string()).await.map_err(alert)?;
            println!("{:?}", outcome);
            Ok(())
        }
        Command::Bookings => {
            let screen = BookingsScreen::new(sample_bookings());
            if let Some(message) = screen.empty_message() {
                println!("{}", message);
            }
            for booking in screen.bookings() {
                let (day, month) = card_date(booking.date);
                println!(
                    "{:>2} {}  {} ({})  {:?}",
                    day, month, booking.title, booking.location, booking.status
                );
            }
            Ok(())
        }
    }
}

/// Log an API failure and reduce it to what the user should see
fn alert(err: ApiError) -> anyhow::Error {
    error!("{}", err);
    anyhow!(err.user_message())
}

fn signed_in_email(session: &SessionContext) -> Result<String> {
    match session.user() {
        Some(user) => Ok(user.email.clone()),
        None => bail!("Please log in first"),
    }
}

async fn fetch_listings(config: &AppConfig, snapshot: Option<PathBuf>) -> Result<Vec<Property>> {
    let source: Box<dyn ListingSource> = match snapshot {
        Some(path) => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Box::new(
                StaticListings::from_json(&json)
                    .with_context(|| format!("Failed to parse {}", path.display()))?,
            )
        }
        None => Box::new(ApiClient::new(config.clone()).map_err(alert)?),
    };
    info!("Loading listings from {}", source.source_name());
    source.fetch_listings().await.map_err(alert)
}

/// The detail screen works from a property snapshot, either handed over
/// directly or taken from the fetched listings.
async fn find_property(config: &AppConfig, target: Target) -> Result<Property> {
    let snapshot = match (target.property, target.id) {
        (Some(snapshot), _) => snapshot,
        (None, Some(id)) => {
            let screen = ListingScreen::new(fetch_listings(config, target.snapshot).await?);
            let property = screen.find(id).ok_or_else(|| anyhow!("Property not found"))?;
            property.to_snapshot().context("Failed to snapshot property")?
        }
        (None, None) => bail!("Pass a property id or --property"),
    };
    Property::from_snapshot(&snapshot).context("Invalid property snapshot")
}

async fn list(
    config: &AppConfig,
    query: &str,
    categories: &[String],
    snapshot: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let mut screen = ListingScreen::new(fetch_listings(config, snapshot).await?);
    screen.set_query(query);
    for label in categories {
        let category = Category::parse(label).ok_or_else(|| {
            anyhow!(
                "Unknown category {:?}, expected one of {}",
                label,
                Category::ALL.map(|c| c.label()).join(", ")
            )
        })?;
        screen.toggle_category(category);
    }

    if let Some(empty) = screen.empty_state() {
        println!("{}", empty.message());
        return Ok(());
    }

    if json {
        for property in screen.visible() {
            println!("{}", property.to_snapshot()?);
        }
        return Ok(());
    }

    if let Some(active) = screen.filter().active() {
        println!("Filter: {}", active);
    }
    println!(
        "Showing {} of {} properties",
        screen.visible_len(),
        screen.listings().len()
    );
    for (i, property) in screen.visible().enumerate() {
        println!("{}. {} ({})", i + 1, property.name, property.price);
        println!("   📍 {}", property.location);
        println!("   {} bd, {}", property.bedrooms, property.area);
        println!("   ID: {}", property.id);
    }
    Ok(())
}

async fn show(config: &AppConfig, target: Target) -> Result<()> {
    let property = find_property(config, target).await?;
    println!("{}", property.name);
    println!("{}  📍 {}", property.price, property.location);
    println!(
        "{} beds · {} baths · {}",
        property.bedrooms, property.bathrooms, property.area
    );
    if let Some(description) = property.description.as_deref().filter(|d| !d.is_empty()) {
        println!();
        println!("About");
        println!("{}", description);
    }
    match model_url(&property, &config.api_base) {
        Some(url) => println!("3D model: {}", url),
        None => println!("{}", PLACEHOLDER_TEXT),
    }
    Ok(())
}

async fn view(
    config: &AppConfig,
    target: Target,
    watch: u64,
    screenshot: Option<PathBuf>,
) -> Result<()> {
    let property = find_property(config, target).await?;
    let url = model_url(&property, &config.api_base);
    let mut viewer = ModelViewer::mount(url.as_deref());

    if viewer.surface() == &Surface::Placeholder {
        println!("🏗️  {}", PLACEHOLDER_TEXT);
        return Ok(());
    }

    let mut options = HostOptions::new(config.data_dir.join("viewer"));
    options.watch = Duration::from_secs(watch);
    options.screenshot = screenshot;
    let name = property.id.to_string();

    let report = tokio::task::spawn_blocking(move || -> Result<_> {
        let host = HeadlessHost::launch()?;
        host.host(&mut viewer, &name, &options)
    })
    .await
    .context("Viewer host panicked")??;

    match &report.state {
        ViewerState::Failed(reason) => println!("Failed to load 3D model: {}", reason),
        ViewerState::Loading => println!("Still loading after {}s", watch),
        state => println!("Viewer {:?}", state),
    }
    println!("{} message(s) from the viewer", report.messages);
    if let Some(fit) = &report.fit {
        println!("Model fitted at scale {:.3}", fit.scale);
    }
    if let Some(path) = &report.document_path {
        println!("Document: {}", path.display());
    }
    if let Some(path) = &report.screenshot {
        println!("Screenshot: {}", path.display());
    }
    Ok(())
}
