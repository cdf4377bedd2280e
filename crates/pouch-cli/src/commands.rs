//! CLI command definitions and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use pouch_core::{
    Amount, AuthProtocol, AuthState, CommandGate, CommandKind, Result, StateStore,
};

use crate::client::HttpTransport;
use crate::display;

/// Pouch - command-line client for the Izly payment wallet
#[derive(Parser)]
#[command(name = "pouch")]
#[command(about = "Command-line client for the Izly phone-linked payment wallet")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the persisted authentication state
    #[arg(long, default_value = "authstate.json")]
    pub state_file: PathBuf,

    /// Base URL of the remote wallet service
    #[arg(long, default_value = "https://soap.izly.fr/Service.asmx")]
    pub endpoint: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the persisted authentication state
    Status,

    /// First authentication phase; triggers the activation SMS
    Login {
        /// Phone number identifying the account
        phone: String,
        password: String,
    },

    /// Second phase: provide the activation code received by SMS
    /// (the last part of the URL in the message, after the final /)
    Activation { code: String },

    /// Refresh an expired session (not to be confused with login)
    Relogin { password: String },

    /// Transaction history
    Historique,

    /// List the registered payment cards with their ids
    Listecb,

    /// Initiate a reload from a registered card; follow with `confirmer`
    Recharger {
        card_id: String,
        /// Amount in euros, e.g. 10 or 12.50
        amount: Amount,
    },

    /// Confirm a pending reload
    Confirmer {
        card_id: String,
        amount: Amount,
        password: String,
    },
}

impl Commands {
    fn kind(&self) -> CommandKind {
        match self {
            Commands::Status => CommandKind::Status,
            Commands::Login { .. } => CommandKind::Login,
            Commands::Activation { .. } => CommandKind::Activation,
            Commands::Relogin { .. } => CommandKind::Relogin,
            Commands::Historique => CommandKind::Statement,
            Commands::Listecb => CommandKind::CardList,
            Commands::Recharger { .. } => CommandKind::Reload,
            Commands::Confirmer { .. } => CommandKind::ConfirmReload,
        }
    }
}

/// Run one command: load state, check capabilities, dispatch, persist.
pub async fn run(cli: Cli) -> Result<()> {
    let gate = CommandGate::new(StateStore::new(&cli.state_file));
    let kind = cli.command.kind();
    let mut state = gate.prepare(kind)?;

    if let Commands::Status = cli.command {
        print_status(&state);
        return Ok(());
    }

    // Every remaining command declares the network capability
    debug_assert!(kind.needs_network());
    let transport = HttpTransport::new(&cli.endpoint);

    match &cli.command {
        Commands::Status => unreachable!("handled above"),

        Commands::Login { phone, password } => {
            info!("starting from a fresh authentication state");
            state = AuthState::default();
            AuthProtocol::new(&transport, &mut state)
                .credential_logon(phone, password)
                .await?;
            println!("Credentials accepted for {phone}.");
            println!("An activation code has been sent by SMS;");
            println!("finish with: pouch activation <code>");
        }

        Commands::Activation { code } => {
            AuthProtocol::new(&transport, &mut state)
                .activate(code)
                .await?;
            println!("Account activated; session established.");
        }

        Commands::Relogin { password } => {
            let envelope = AuthProtocol::new(&transport, &mut state)
                .relogin(password)
                .await?;
            display::render(&envelope);
            println!("Session refreshed.");
        }

        Commands::Historique => {
            let envelope = AuthProtocol::new(&transport, &mut state)
                .statement()
                .await?;
            display::render(&envelope);
        }

        Commands::Listecb => {
            let envelope = AuthProtocol::new(&transport, &mut state)
                .card_list()
                .await?;
            display::render(&envelope);
        }

        Commands::Recharger { card_id, amount } => {
            let envelope = AuthProtocol::new(&transport, &mut state)
                .reload(card_id, *amount)
                .await?;
            display::render(&envelope);
            println!("Reload initiated; confirm with: pouch confirmer {card_id} {amount} <password>");
        }

        Commands::Confirmer {
            card_id,
            amount,
            password,
        } => {
            let envelope = AuthProtocol::new(&transport, &mut state)
                .confirm_reload(card_id, *amount, password)
                .await?;
            display::render(&envelope);
            println!("Reload confirmed.");
        }
    }

    gate.commit(&state)?;
    Ok(())
}

fn print_status(state: &AuthState) {
    println!("Phone:            {}", field(&state.identity));
    println!("Counter:          {}", state.counter);
    println!("Activation code:  {}", presence(&state.activation_secret));
    println!("Bearer token:     {}", presence(&state.bearer_token));
    println!("Session id:       {}", field(&state.session_id));
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(none)")
}

fn presence(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "present"
    } else {
        "(none)"
    }
}
