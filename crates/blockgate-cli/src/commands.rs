use std::sync::Arc;

use anyhow::{bail, Context};
use blockgate_gateway::{ensure_version, Gateway, GatewayError, KeyItem};
use blockgate_registry::{register_kv_protocol, ProtocolRegistry, KV_SCHEME};
use blockgate_uri::Locator;
use colored::Colorize;
use serde_json::json;

use crate::cli::*;
use crate::config::BlockgateConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = BlockgateConfig::discover(cli.config.as_deref())?
        .with_overrides(cli.data_dir, cli.backend);
    let out = Output(cli.format);

    if let Command::Config = cli.command {
        return cmd_config(&config, out);
    }

    let registry = ProtocolRegistry::new();
    register_kv_protocol(&registry, config.open_backend()?, false)?;
    let session = Session {
        config,
        registry,
        out,
    };

    match cli.command {
        Command::Start(args) => session.cmd_start(args).await,
        Command::Put(args) => session.cmd_put(args).await,
        Command::Get(args) => session.cmd_get(args).await,
        Command::Delete(args) => session.cmd_delete(args).await,
        Command::Destroy(args) => session.cmd_destroy(args).await,
        Command::Keybag(args) => session.cmd_keybag(args).await,
        Command::Protocols => session.cmd_protocols(),
        Command::Config => cmd_config(&session.config, out),
    }
}

#[derive(Clone, Copy)]
struct Output(OutputFormat);

impl Output {
    fn json(self) -> bool {
        self.0 == OutputFormat::Json
    }

    fn emit(self, value: serde_json::Value) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(&value)?);
        Ok(())
    }
}

fn cmd_config(config: &BlockgateConfig, out: Output) -> anyhow::Result<()> {
    if out.json() {
        return out.emit(serde_json::to_value(config)?);
    }
    print!("{}", config.to_toml()?);
    Ok(())
}

struct Session {
    config: BlockgateConfig,
    registry: ProtocolRegistry,
    out: Output,
}

impl Session {
    fn base(&self, args: &LocatorArgs) -> anyhow::Result<Locator> {
        match &args.locator {
            Some(text) => text
                .parse()
                .with_context(|| format!("invalid locator {text:?}")),
            None => self.config.base_locator(),
        }
    }

    /// Resolve the gateway for `base`, start it, and check its version.
    async fn started(&self, base: &Locator) -> anyhow::Result<(Arc<dyn Gateway>, Locator)> {
        let gateway = self.registry.gateway(base)?;
        let started = gateway
            .start(base)
            .await
            .with_context(|| format!("starting {base}"))?;
        ensure_version(&started)?;
        Ok((gateway, started))
    }

    async fn cmd_start(&self, args: LocatorArgs) -> anyhow::Result<()> {
        let base = self.base(&args)?;
        let (_, started) = self.started(&base).await?;
        if self.out.json() {
            return self.out.emit(json!({ "locator": started.to_string() }));
        }
        println!("{} Started {}", "✓".green().bold(), started.to_string().cyan());
        Ok(())
    }

    async fn cmd_put(&self, args: PutArgs) -> anyhow::Result<()> {
        let body = match (&args.value, &args.file) {
            (_, Some(path)) => {
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))?
            }
            (Some(value), None) => value.clone().into_bytes(),
            (None, None) => bail!("either a value or --file is required"),
        };
        let base = self.base(&args.base)?;
        let (gateway, started) = self.started(&base).await?;
        let url = gateway.build_url(&started, &args.key);
        gateway.put(&url, &body).await?;
        gateway.close(&started).await?;

        if self.out.json() {
            return self.out.emit(json!({ "key": args.key, "bytes": body.len() }));
        }
        println!(
            "{} Stored {} ({} bytes)",
            "✓".green().bold(),
            args.key.yellow(),
            body.len()
        );
        Ok(())
    }

    async fn cmd_get(&self, args: GetArgs) -> anyhow::Result<()> {
        let base = self.base(&args.base)?;
        let (gateway, started) = self.started(&base).await?;
        let body = match gateway.get(&gateway.build_url(&started, &args.key)).await {
            Ok(body) => body,
            Err(GatewayError::NotFound { key }) => bail!("block {key} not found"),
            Err(e) => return Err(e.into()),
        };

        if let Some(path) = &args.out {
            std::fs::write(path, &body).with_context(|| format!("writing {}", path.display()))?;
            if !self.out.json() {
                println!(
                    "{} Wrote {} bytes to {}",
                    "✓".green().bold(),
                    body.len(),
                    path.display()
                );
                return Ok(());
            }
        }

        if self.out.json() {
            let text = std::str::from_utf8(&body).ok();
            return self.out.emit(json!({
                "key": args.key,
                "bytes": body.len(),
                "hex": hex::encode(&body),
                "text": text,
            }));
        }
        match std::str::from_utf8(&body) {
            Ok(text) => println!("{text}"),
            Err(_) => println!("{}", hex::encode(&body)),
        }
        Ok(())
    }

    async fn cmd_delete(&self, args: KeyArgs) -> anyhow::Result<()> {
        let base = self.base(&args.base)?;
        let (gateway, started) = self.started(&base).await?;
        gateway.delete(&gateway.build_url(&started, &args.key)).await?;
        gateway.close(&started).await?;
        if self.out.json() {
            return self.out.emit(json!({ "deleted": args.key }));
        }
        println!("{} Deleted {}", "✓".green().bold(), args.key.yellow());
        Ok(())
    }

    async fn cmd_destroy(&self, args: LocatorArgs) -> anyhow::Result<()> {
        let base = self.base(&args)?;
        let gateway = self.registry.gateway(&base)?;
        gateway
            .destroy(&base)
            .await
            .with_context(|| format!("destroying {base}"))?;
        if self.out.json() {
            return self.out.emit(json!({ "destroyed": base.to_string() }));
        }
        println!("{} Destroyed {}", "✓".green().bold(), base.to_string().cyan());
        Ok(())
    }

    fn keybag_locator(locator: Option<&str>) -> anyhow::Result<Locator> {
        match locator {
            Some(text) => text
                .parse()
                .with_context(|| format!("invalid locator {text:?}")),
            None => Ok(Locator::new(KV_SCHEME, "")?),
        }
    }

    async fn cmd_keybag(&self, args: KeybagArgs) -> anyhow::Result<()> {
        match args.action {
            KeybagAction::Get { id, locator } => {
                let bag = self.registry.keybag(&Self::keybag_locator(locator.as_deref())?)?;
                let item = bag.get(&id).await?;
                if self.out.json() {
                    return self.out.emit(json!({ "id": id, "item": item }));
                }
                match item {
                    Some(item) => {
                        println!("{} {}", "id:".bold(), id.yellow());
                        println!("  name: {}", item.name);
                        println!("  key:  {}", item.key.cyan());
                        for (field, value) in &item.extra {
                            println!("  {field}: {value}");
                        }
                    }
                    None => println!("No key item stored under {}", id.yellow()),
                }
                Ok(())
            }
            KeybagAction::Set {
                id,
                name,
                key,
                locator,
            } => {
                let bag = self.registry.keybag(&Self::keybag_locator(locator.as_deref())?)?;
                bag.set(&id, &KeyItem::new(name, key)).await?;
                if self.out.json() {
                    return self.out.emit(json!({ "stored": id }));
                }
                println!("{} Stored key item {}", "✓".green().bold(), id.yellow());
                Ok(())
            }
        }
    }

    fn cmd_protocols(&self) -> anyhow::Result<()> {
        let protocols = self.registry.protocols()?;
        let keybags = self.registry.keybag_protocols()?;
        let mut rows = Vec::with_capacity(protocols.len());
        for protocol in &protocols {
            let base = self.registry.default_base(protocol)?;
            rows.push((protocol.clone(), base.map(|b| b.to_string())));
        }

        if self.out.json() {
            let stores: Vec<_> = rows
                .iter()
                .map(|(protocol, base)| json!({ "protocol": protocol, "default_base": base }))
                .collect();
            return self.out.emit(json!({ "stores": stores, "keybags": keybags }));
        }
        for (protocol, base) in &rows {
            let base = base.as_deref().unwrap_or("-");
            let keybag = if keybags.contains(protocol) { "keybag" } else { "" };
            println!("{:<8} {} {}", protocol.bold(), base.cyan(), keybag.dimmed());
        }
        Ok(())
    }
}
