//! `fretrack` - CLI for fretetrack
//!
//! This binary provides the command-line interface for registering
//! shipments, recording position reports, and answering tracking queries.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use fretetrack::cli::{
    AdminCommand, Cli, Command, ConfigCommand, DriverCommand, ExpenseCommand, LocateCommand,
    PositionCommand, ReceiptCommand, ShipmentCommand, ShipmentForm, StatusCommand,
};
use fretetrack::shipment::DriverRef;
use fretetrack::{
    init_logging, AccountRepository, AdminAccount, Config, Coordinate, Error, ExpenseCategory,
    NominatimGeocoder, Shipment, ShipmentDraft, ShipmentRepository, SqliteStore, Tracker,
};

type AppTracker = Tracker<SqliteStore, NominatimGeocoder>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Config(cmd) => handle_config(&config, cmd),
        Command::Status(cmd) => handle_status(&config, &cmd),
        command => {
            let tracker = build_tracker(&config)?;
            match command {
                Command::Locate(cmd) => handle_locate(&tracker, &cmd).await,
                Command::Shipment(cmd) => handle_shipment(&tracker, cmd).await,
                Command::Position(cmd) => handle_position(&tracker, &cmd).await,
                Command::Expense(cmd) => handle_expense(&tracker, &cmd),
                Command::Receipt(cmd) => handle_receipt(&tracker, &cmd),
                Command::Driver(cmd) => handle_driver(&tracker, cmd),
                Command::Admin(cmd) => handle_admin(&tracker, cmd),
                Command::Config(_) | Command::Status(_) => unreachable!("handled above"),
            }
        }
    }
}

/// Open the store, seed the first admin, and wire up the service.
fn build_tracker(config: &Config) -> anyhow::Result<AppTracker> {
    let store = SqliteStore::open(config.database_path())
        .with_context(|| format!("opening store at {}", config.database_path().display()))?;

    store.seed_admin(&AdminAccount {
        username: config.bootstrap.admin_username.clone(),
        password: config.bootstrap.admin_password.clone(),
    })?;

    let geocoder = NominatimGeocoder::new(&config.geocoder)?;
    Ok(Tracker::new(store, geocoder, config.tracking.clone()))
}

async fn handle_locate(tracker: &AppTracker, cmd: &LocateCommand) -> anyhow::Result<()> {
    let shipment = tracker.locate(&cmd.code).await?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&shipment)?);
    } else {
        print_shipment(&shipment);
    }
    Ok(())
}

async fn handle_shipment(tracker: &AppTracker, cmd: ShipmentCommand) -> anyhow::Result<()> {
    match cmd {
        ShipmentCommand::Add(form) => {
            let draft = form_to_draft(tracker, form)?;
            let shipment = tracker.register(draft).await?;
            println!(
                "Registered shipment {} ({}% complete)",
                shipment.code, shipment.progress
            );
        }
        ShipmentCommand::Update { code, form } => {
            let draft = form_to_draft(tracker, form)?;
            let shipment = tracker.revise(&code, draft).await?;
            println!(
                "Revised shipment {} ({}% complete)",
                shipment.code, shipment.progress
            );
        }
        ShipmentCommand::Show { code, json } => {
            let shipment = tracker
                .store()
                .get(&code)?
                .ok_or_else(|| Error::shipment_not_found(&code))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&shipment)?);
            } else {
                print_shipment(&shipment);
            }
        }
        ShipmentCommand::List { json } => {
            let shipments = tracker.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&shipments)?);
            } else if shipments.is_empty() {
                println!("No shipments registered.");
            } else {
                for s in shipments {
                    println!(
                        "{}  {:<18} {:>3}%  {} -> {}",
                        s.code,
                        s.status.label(),
                        s.progress,
                        s.origin,
                        s.destination
                    );
                }
            }
        }
        ShipmentCommand::Remove { code } => {
            if tracker.remove(&code)? {
                println!("Removed shipment {code}");
            } else {
                println!("No shipment registered under code {code}");
            }
        }
    }
    Ok(())
}

async fn handle_position(tracker: &AppTracker, cmd: &PositionCommand) -> anyhow::Result<()> {
    let position = Coordinate::new(cmd.lat, cmd.lon);
    let shipment = tracker
        .report_position(&cmd.code, position, &cmd.by, cmd.notes.clone(), cmd.complete)
        .await?;

    println!(
        "{}: {} at {}, {} ({}% complete)",
        shipment.code,
        shipment.status.label(),
        shipment.current.city,
        shipment.current.state,
        shipment.progress
    );
    if let Some(remaining) = shipment.remaining_km() {
        println!("Remaining: ~{:.0} km", remaining);
    }
    Ok(())
}

fn handle_expense(tracker: &AppTracker, cmd: &ExpenseCommand) -> anyhow::Result<()> {
    let category = ExpenseCategory::from(cmd.category);
    let shipment = tracker.add_expense(&cmd.code, category, &cmd.description, cmd.value)?;
    println!(
        "Logged {} expense of R$ {:.2} against {} (total R$ {:.2})",
        category.label(),
        cmd.value,
        shipment.code,
        shipment.expense_total()
    );
    Ok(())
}

fn handle_receipt(tracker: &AppTracker, cmd: &ReceiptCommand) -> anyhow::Result<()> {
    let receipt = tracker.receipt(&cmd.code)?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else {
        print!("{}", receipt.render_plain());
    }
    Ok(())
}

fn handle_driver(tracker: &AppTracker, cmd: DriverCommand) -> anyhow::Result<()> {
    match cmd {
        DriverCommand::Add {
            name,
            password,
            phone,
        } => {
            let driver = tracker.add_driver(&name, &password, phone)?;
            println!("Registered driver {} ({})", driver.name, driver.id);
        }
        DriverCommand::List => {
            let drivers = tracker.drivers()?;
            if drivers.is_empty() {
                println!("No drivers registered.");
            }
            for driver in drivers {
                println!(
                    "{}  {}  {}",
                    driver.id,
                    driver.name,
                    driver.phone.as_deref().unwrap_or("-")
                );
            }
        }
        DriverCommand::Remove { id } => {
            if tracker.remove_driver(&id)? {
                println!("Removed driver {id}");
            } else {
                println!("No driver with id {id}");
            }
        }
    }
    Ok(())
}

fn handle_admin(tracker: &AppTracker, cmd: AdminCommand) -> anyhow::Result<()> {
    match cmd {
        AdminCommand::Add { username, password } => {
            tracker.add_admin(&username, &password)?;
            println!("Created admin account {username}");
        }
        AdminCommand::List => {
            for admin in tracker.admins()? {
                println!("{}", admin.username);
            }
        }
        AdminCommand::Remove { username } => {
            if tracker.remove_admin(&username)? {
                println!("Removed admin account {username}");
            } else {
                println!("No admin account named {username}");
            }
        }
    }
    Ok(())
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let store = SqliteStore::open(config.database_path())?;
    let stats = store.stats()?;

    if cmd.json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "total_shipments": stats.total_shipments,
            "in_transit": stats.in_transit,
            "delivered": stats.delivered,
            "drivers": stats.drivers,
            "newest_update": stats.newest_update,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("fretrack status");
        println!("---------------");
        println!("Database:      {}", config.database_path().display());
        println!("Shipments:     {}", stats.total_shipments);
        println!("  in transit:  {}", stats.in_transit);
        println!("  delivered:   {}", stats.delivered);
        println!("Drivers:       {}", stats.drivers);
        if let Some(newest) = stats.newest_update {
            println!("Last update:   {newest}");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:     {}", config.database_path().display());
                println!();
                println!("[Geocoder]");
                println!("  Endpoint:          {}", config.geocoder.endpoint);
                println!("  Country bias:      {}", config.geocoder.country_bias);
                println!("  Timeout (s):       {}", config.geocoder.timeout_secs);
                println!();
                println!("[Tracking]");
                println!("  Code prefix:       {}", config.tracking.code_prefix);
                println!(
                    "  Arrival radius:    {} km",
                    config.tracking.arrival_radius_km
                );
                println!("  Default ETA:       +{} days", config.tracking.default_eta_days);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

/// Resolve the CLI form into a service draft, looking up the driver link.
fn form_to_draft(tracker: &AppTracker, form: ShipmentForm) -> anyhow::Result<ShipmentDraft> {
    let driver = match form.driver {
        Some(name) => {
            let driver = tracker
                .store()
                .find_driver(&name)?
                .ok_or(Error::UnknownAccount { username: name })?;
            Some(DriverRef {
                id: driver.id,
                name: driver.name,
            })
        }
        None => None,
    };

    Ok(ShipmentDraft {
        code: form.code,
        status: form.status.into(),
        origin: form.origin,
        destination: form.destination,
        destination_address: form.destination_address,
        current_city: form.city,
        current_state: form.state,
        message: form.message,
        notes: form.notes,
        estimated_delivery: form.eta,
        driver,
        registered_by: form.by,
    })
}

fn print_shipment(shipment: &Shipment) {
    println!("Shipment:      {}", shipment.code);
    println!(
        "Status:        {} ({}%)",
        shipment.status.label(),
        shipment.progress
    );
    println!(
        "Current:       {}, {}",
        shipment.current.city, shipment.current.state
    );
    if let Some(address) = &shipment.current.address {
        println!("Address:       {address}");
    }
    println!("Origin:        {}", shipment.origin);
    println!("Destination:   {}", shipment.destination);
    if let Some(remaining) = shipment.remaining_km() {
        println!("Remaining:     ~{remaining:.0} km");
    }
    if let Some(eta) = shipment.estimated_delivery {
        println!("ETA:           {eta}");
    }
    if let Some(driver) = &shipment.driver {
        println!("Driver:        {}", driver.name);
    }
    println!(
        "Updated:       {}{}",
        shipment.update_stamp(),
        shipment
            .updated_by
            .as_deref()
            .map(|by| format!(" ({by})"))
            .unwrap_or_default()
    );
    println!("Message:       {}", shipment.message);
}
