use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context};
use colored::Colorize;
use compreg_resolver::{
    ComponentId, Drift, FsStoreDirectory, MappingFile, Properties, Registry, SourceRef,
    StoreDirectory, StoreListing,
};
use serde_json::{json, Value};

use crate::builtin;
use crate::cli::*;
use crate::config::CliConfig;

/// Everything a command needs: the resolved config and the registry.
struct Session {
    mapping_path: PathBuf,
    registry: Registry<FsStoreDirectory>,
    format: OutputFormat,
}

impl Session {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        let config = CliConfig::load(cli.config.as_deref())?
            .with_overrides(cli.root.clone(), cli.mapping.clone());
        let mapping_path = config.mapping_path();
        let mappings = MappingFile::load_or_default(&mapping_path)
            .with_context(|| format!("loading mapping file {}", mapping_path.display()))?;
        let registry = Registry::new(
            mappings,
            FsStoreDirectory::new(&config.root),
            builtin::implementations()?,
        );
        Ok(Self {
            mapping_path,
            registry,
            format: cli.format,
        })
    }

    fn save(&self) -> anyhow::Result<()> {
        self.registry
            .mappings()
            .save(&self.mapping_path)
            .with_context(|| format!("saving mapping file {}", self.mapping_path.display()))
    }

    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut ctx = Session::open(&cli)?;
    match cli.command {
        Command::Init(args) => cmd_init(&ctx, args),
        Command::Register(args) => cmd_register(&mut ctx, args),
        Command::Deregister(args) => cmd_deregister(&mut ctx, args),
        Command::List(args) => cmd_list(&ctx, args),
        Command::Show(args) => cmd_show(&ctx, args),
        Command::Whois(args) => cmd_whois(&ctx, args),
        Command::Enumerate(args) => cmd_enumerate(&ctx, args),
        Command::Check(args) => cmd_check(&ctx, args),
        Command::Sources => cmd_sources(&ctx),
    }
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_drift(drift: &[Drift]) {
    for d in drift {
        println!("  {} {}", "drift:".red().bold(), d);
    }
}

/// Parse `NAME=VALUE` pairs. VALUE is taken as JSON if it parses, else as a string.
fn parse_properties(pairs: &[String]) -> anyhow::Result<Properties> {
    let mut props = Properties::new();
    for pair in pairs {
        let Some((name, raw)) = pair.split_once('=') else {
            bail!("property {pair:?} is not NAME=VALUE");
        };
        if name.is_empty() {
            bail!("property {pair:?} has an empty name");
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        props.insert(name.to_string(), value);
    }
    Ok(props)
}

fn cmd_init(ctx: &Session, args: InitArgs) -> anyhow::Result<()> {
    let stores: Vec<String> = if args.stores.is_empty() {
        builtin::DEFAULT_STORES.iter().map(|s| s.to_string()).collect()
    } else {
        args.stores
    };

    let root = ctx.registry.store_directory();
    for store in &stores {
        let path = root.store_path(store)?;
        std::fs::create_dir_all(&path)
            .with_context(|| format!("creating store {}", path.display()))?;
    }
    ctx.save()?;

    if ctx.json() {
        return print_json(&json!({
            "root": root.root(),
            "mapping": ctx.mapping_path,
            "stores": stores,
        }));
    }
    println!(
        "{} Initialized registry in {}",
        "✓".green().bold(),
        root.root().display().to_string().bold()
    );
    println!("  Mapping: {}", ctx.mapping_path.display());
    for store in &stores {
        println!("  Store: {}", store.yellow());
    }
    Ok(())
}

fn cmd_register(ctx: &mut Session, args: RegisterArgs) -> anyhow::Result<()> {
    let source = SourceRef::parse(&args.source)?;
    let properties = parse_properties(&args.properties)?;
    let record = ctx
        .registry
        .register(&args.store, &args.key, source, properties)?;
    if let Err(e) = ctx.save() {
        if let Err(undo) = ctx.registry.deregister(&args.store, &args.key) {
            tracing::warn!(
                store = %args.store,
                key = %args.key,
                error = %undo,
                "could not undo registration"
            );
        }
        return Err(e);
    }

    if ctx.json() {
        return print_json(&json!({
            "store": args.store,
            "key": args.key,
            "uuid": record.id(),
            "source": record.source(),
        }));
    }
    println!(
        "{} Registered {} in {}",
        "✓".green().bold(),
        args.key.yellow().bold(),
        args.store.bold()
    );
    println!("  UUID: {}", record.id().to_string().cyan());
    println!("  Source: {}", record.source());
    Ok(())
}

fn cmd_deregister(ctx: &mut Session, args: DeregisterArgs) -> anyhow::Result<()> {
    let record = ctx.registry.deregister(&args.store, &args.key)?;
    ctx.save()?;

    if ctx.json() {
        return print_json(&json!({
            "store": args.store,
            "key": args.key,
            "uuid": record.id(),
        }));
    }
    println!(
        "Deregistered {} ({}) from {}",
        args.key.yellow(),
        record.id().short_id().dimmed(),
        args.store.bold()
    );
    Ok(())
}

/// Stores to list: every store with a mapping table plus every store
/// directory on disk, or just `only` if given.
fn listed_stores(ctx: &Session, only: Option<&str>) -> anyhow::Result<Vec<String>> {
    if let Some(store) = only {
        return Ok(vec![store.to_string()]);
    }
    let mut stores: BTreeSet<String> = ctx.registry.mappings().stores.keys().cloned().collect();
    stores.extend(ctx.registry.store_directory().stores()?);
    Ok(stores.into_iter().collect())
}

fn list_value(ctx: &Session, stores: &[String]) -> anyhow::Result<Value> {
    let mut out = serde_json::Map::new();
    for store in stores {
        out.insert(store.clone(), serde_json::to_value(ctx.registry.table(store))?);
    }
    Ok(Value::Object(out))
}

fn cmd_list(ctx: &Session, args: ListArgs) -> anyhow::Result<()> {
    let stores = listed_stores(ctx, args.store.as_deref())?;

    if ctx.json() {
        return print_json(&list_value(ctx, &stores)?);
    }

    if stores.is_empty() {
        println!("No stores.");
        return Ok(());
    }
    for store in &stores {
        let table = ctx.registry.table(store);
        println!("{}", store.bold());
        if table.is_empty() {
            println!("  {}", "(no components)".dimmed());
        }
        for (key, record) in table.iter() {
            println!(
                "  {}  {}  {}",
                record.id().short_id().dimmed(),
                key.yellow(),
                record.source()
            );
        }
    }
    Ok(())
}

fn cmd_show(ctx: &Session, args: ShowArgs) -> anyhow::Result<()> {
    let (record, artifact) = ctx.registry.describe(&args.store, &args.key)?;

    if ctx.json() {
        return print_json(&json!({
            "store": args.store,
            "key": args.key,
            "uuid": record.id(),
            "source": record.source(),
            "artifact": artifact,
        }));
    }
    println!("{} in {}", args.key.yellow().bold(), args.store.bold());
    println!("  UUID: {}", record.id().to_string().cyan());
    println!("  Source: {}", record.source());
    match artifact {
        Some(artifact) => {
            println!("  Created: {}", artifact.created_at.to_rfc3339());
            for (name, value) in &artifact.properties {
                println!("  {name} = {value}");
            }
        }
        None => println!("  {}", "not persisted".red()),
    }
    Ok(())
}

fn cmd_whois(ctx: &Session, args: WhoisArgs) -> anyhow::Result<()> {
    let id = ComponentId::parse(&args.id)?;
    let key = ctx.registry.key_for_identity(&args.store, &id)?;

    if ctx.json() {
        return print_json(&json!({ "store": args.store, "uuid": id, "key": key }));
    }
    println!("{} → {}", id.to_string().cyan(), key.yellow().bold());
    Ok(())
}

fn listing_value(listing: &StoreListing) -> Value {
    let components: Vec<Value> = listing
        .components
        .iter()
        .map(|(key, c)| json!({ "key": key, "uuid": c.id(), "kind": c.kind() }))
        .collect();
    json!({
        "store": listing.store,
        "components": components,
        "drift": listing.drift,
    })
}

fn cmd_enumerate(ctx: &Session, args: StoreArgs) -> anyhow::Result<()> {
    let listing = ctx.registry.enumerate(&args.store)?;

    if ctx.json() {
        return print_json(&listing_value(&listing));
    }

    if listing.is_empty() {
        println!("No live components in {}.", args.store.bold());
    }
    for (key, component) in &listing.components {
        println!(
            "  {} {}  {}  {}",
            "✓".green(),
            component.id().short_id().dimmed(),
            key.yellow(),
            component.kind().cyan()
        );
    }
    print_drift(&listing.drift);
    Ok(())
}

fn cmd_check(ctx: &Session, args: StoreArgs) -> anyhow::Result<()> {
    let report = ctx.registry.check(&args.store)?;

    if ctx.json() {
        print_json(&serde_json::to_value(&report)?)?;
    } else {
        println!(
            "Store {}: {} consistent, {} drift",
            args.store.bold(),
            report.consistent.len().to_string().green(),
            report.drift.len().to_string().red()
        );
        print_drift(&report.drift);
    }

    if !report.is_consistent() {
        bail!("store {} is out of sync with its mapping", args.store);
    }
    Ok(())
}

fn cmd_sources(ctx: &Session) -> anyhow::Result<()> {
    let sources: Vec<&str> = ctx.registry.loader().sources().map(SourceRef::as_str).collect();
    if ctx.json() {
        return print_json(&json!(sources));
    }
    for source in sources {
        println!("  {source}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_parse_json_or_string() {
        let props = parse_properties(&[
            "path=/data".to_string(),
            "retries=3".to_string(),
            "flags={\"fast\":true}".to_string(),
        ])
        .unwrap();
        assert_eq!(props["path"], "/data");
        assert_eq!(props["retries"], 3);
        assert_eq!(props["flags"]["fast"], true);
    }

    #[test]
    fn properties_reject_missing_equals() {
        assert!(parse_properties(&["path".to_string()]).is_err());
        assert!(parse_properties(&["=x".to_string()]).is_err());
    }

    fn run(root: &std::path::Path, args: &[&str]) -> anyhow::Result<()> {
        use clap::Parser;
        let mut argv = vec!["compreg", "--root"];
        argv.push(root.to_str().unwrap());
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv)?)
    }

    #[test]
    fn register_enumerate_deregister_flow() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        run(root, &["init"]).unwrap();
        assert!(root.join("orchestrators").is_dir());
        assert!(root.join("mapping.toml").is_file());

        run(root, &["register", "orchestrators", "local", builtin::LOCAL_ORCHESTRATOR]).unwrap();
        run(root, &["enumerate", "orchestrators"]).unwrap();
        run(root, &["check", "orchestrators"]).unwrap();

        let mapping = MappingFile::load(&root.join("mapping.toml")).unwrap();
        let id = mapping.table("orchestrators").unwrap().get("local").unwrap().id();
        run(root, &["whois", "orchestrators", &id.to_string()]).unwrap();

        run(root, &["deregister", "orchestrators", "local"]).unwrap();
        let mapping = MappingFile::load(&root.join("mapping.toml")).unwrap();
        assert!(mapping.table("orchestrators").unwrap().is_empty());
    }

    #[test]
    fn check_fails_on_orphaned_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        run(root, &["init", "--store", "artifact_stores"]).unwrap();
        std::fs::write(
            root.join("artifact_stores").join(format!("{}.json", ComponentId::new())),
            b"{}",
        )
        .unwrap();

        assert!(run(root, &["check", "artifact_stores"]).is_err());
        // Enumeration still succeeds and reports the orphan as drift.
        run(root, &["enumerate", "artifact_stores"]).unwrap();
    }

    fn session(root: &std::path::Path, args: &[&str]) -> Session {
        use clap::Parser;
        let mut argv = vec!["compreg", "--root"];
        argv.push(root.to_str().unwrap());
        argv.extend_from_slice(args);
        Session::open(&Cli::try_parse_from(argv).unwrap()).unwrap()
    }

    fn write_orphan(root: &std::path::Path, store: &str) -> ComponentId {
        let orphan = ComponentId::new();
        std::fs::write(root.join(store).join(format!("{orphan}.json")), b"{}").unwrap();
        orphan
    }

    #[test]
    fn enumerate_json_names_components_and_drift() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        run(root, &["init", "--store", "orchestrators"]).unwrap();
        run(root, &["register", "orchestrators", "local", builtin::LOCAL_ORCHESTRATOR]).unwrap();
        let orphan = write_orphan(root, "orchestrators");

        let ctx = session(root, &["enumerate", "orchestrators", "--format", "json"]);
        let listing = ctx.registry.enumerate("orchestrators").unwrap();
        let value = listing_value(&listing);

        assert_eq!(value["store"], "orchestrators");
        assert_eq!(value["components"].as_array().unwrap().len(), 1);
        assert_eq!(value["components"][0]["key"], "local");
        assert_eq!(value["components"][0]["kind"], "orchestrator");
        assert_eq!(value["drift"][0]["kind"], "unregistered");
        assert_eq!(value["drift"][0]["id"], orphan.to_string());
        assert_eq!(
            listing.drift[0].to_string(),
            format!("{orphan}: persisted but not registered")
        );
    }

    #[test]
    fn check_json_reports_both_directions() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        run(root, &["init", "--store", "artifact_stores"]).unwrap();
        run(root, &["register", "artifact_stores", "kept", builtin::LOCAL_ARTIFACT_STORE]).unwrap();
        run(root, &["register", "artifact_stores", "lost", builtin::LOCAL_ARTIFACT_STORE]).unwrap();
        let orphan = write_orphan(root, "artifact_stores");

        let ctx = session(root, &["check", "artifact_stores"]);
        let lost = ctx.registry.table("artifact_stores").get("lost").unwrap().id();
        std::fs::remove_file(root.join("artifact_stores").join(format!("{lost}.json"))).unwrap();

        let value = serde_json::to_value(ctx.registry.check("artifact_stores").unwrap()).unwrap();
        assert_eq!(value["consistent"].as_array().unwrap().len(), 1);
        assert_eq!(value["consistent"][0][0], "kept");
        let drift = value["drift"].as_array().unwrap();
        assert_eq!(drift.len(), 2);
        assert!(drift.iter().any(|d| d["kind"] == "unregistered" && d["id"] == orphan.to_string()));
        assert!(drift.iter().any(|d| d["kind"] == "not_persisted" && d["key"] == "lost"));

        assert!(run(root, &["check", "artifact_stores", "--format", "json"]).is_err());
    }

    #[test]
    fn list_includes_store_directories_without_components() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        run(root, &["init", "--store", "orchestrators", "--store", "artifact_stores"]).unwrap();
        run(root, &["register", "orchestrators", "local", builtin::LOCAL_ORCHESTRATOR]).unwrap();
        std::fs::create_dir(root.join("metadata_stores")).unwrap();

        let ctx = session(root, &["list"]);
        let stores = listed_stores(&ctx, None).unwrap();
        assert_eq!(stores, vec!["artifact_stores", "metadata_stores", "orchestrators"]);
        assert_eq!(listed_stores(&ctx, Some("orchestrators")).unwrap(), vec!["orchestrators"]);

        let value = list_value(&ctx, &stores).unwrap();
        assert_eq!(value["artifact_stores"], json!({}));
        assert_eq!(value["orchestrators"]["local"]["source"], builtin::LOCAL_ORCHESTRATOR);

        run(root, &["list"]).unwrap();
        run(root, &["list", "--format", "json"]).unwrap();
    }

    #[test]
    fn failed_mapping_save_undoes_registration() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        run(root, &["init", "--store", "orchestrators"]).unwrap();
        let blocker = root.join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let mut ctx = session(root, &["list"]);
        ctx.mapping_path = blocker.join("mapping.toml");
        let args = RegisterArgs {
            store: "orchestrators".into(),
            key: "local".into(),
            source: builtin::LOCAL_ORCHESTRATOR.into(),
            properties: Vec::new(),
        };

        assert!(cmd_register(&mut ctx, args).is_err());
        assert!(ctx.registry.table("orchestrators").is_empty());
        assert_eq!(std::fs::read_dir(root.join("orchestrators")).unwrap().count(), 0);
    }

    #[test]
    fn enumerate_missing_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &["enumerate", "orchestrators"]).is_err());
    }
}
