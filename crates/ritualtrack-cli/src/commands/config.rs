use clap::Subcommand;
use ritualtrack_core::storage::{data_dir, Config};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "storage.backend", "protocol.trend_window")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reset one key, or the whole config, to defaults
    Reset {
        /// Config key; omit to reset everything
        key: Option<String>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let dir = data_dir()?;
    let mut config = Config::load_from(&dir)?;

    match action {
        ConfigAction::Get { key } => match config.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save_to(&dir)?;
            println!("ok");
        }
        ConfigAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                for (key, value) in config.list() {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset { key } => {
            config.reset(key.as_deref())?;
            config.save_to(&dir)?;
            match key {
                Some(key) => println!("{key} reset to default"),
                None => println!("config reset to defaults"),
            }
        }
    }
    Ok(())
}
