use serde::Serialize;
use zonal_admin::ZoneUpdate;
use zonal_catalog::{Catalog, TargetResolver, TargetSpec, pretty_key};
use zonal_core::{ZoneConfig, ZoneLocator};

use super::Context;

fn parse_target(raw: &str) -> anyhow::Result<TargetSpec> {
    Ok(raw.parse::<TargetSpec>()?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Human-readable name for a stored locator, falling back to raw ids for
/// descriptors missing from the catalog.
pub fn describe_locator(catalog: &Catalog, locator: &ZoneLocator) -> String {
    if *locator == ZoneLocator::root() {
        return "RANGE default".to_string();
    }
    if let Some(db) = catalog.database(locator.id) {
        return format!("DATABASE {}", db.name);
    }
    let Some(table) = catalog.table(locator.id) else {
        return locator.to_string();
    };
    let database = catalog
        .database(table.parent_id)
        .map(|d| d.name.clone())
        .unwrap_or_else(|| table.parent_id.to_string());
    let table_name = format!("{database}.{}", table.name);
    let Some(index_id) = locator.index_id else {
        return format!("TABLE {table_name}");
    };
    let index = table
        .find_index(index_id)
        .map(|i| i.name.clone())
        .unwrap_or_else(|| index_id.to_string());
    match &locator.partition {
        Some(partition) => format!("PARTITION {partition} OF INDEX {table_name}@{index}"),
        None => format!("INDEX {table_name}@{index}"),
    }
}

fn print_config(config: &ZoneConfig) -> anyhow::Result<()> {
    let rendered = config.to_toml_string()?;
    for line in rendered.lines() {
        println!("  {line}");
    }
    Ok(())
}

pub fn show(ctx: &Context, raw: &str) -> anyhow::Result<()> {
    let spec = parse_target(raw)?;
    let res = ctx.admin.show(&ctx.catalog, ctx.database(), &spec)?;
    if ctx.json {
        return print_json(&res);
    }

    let resolver = TargetResolver::new(&ctx.catalog, ctx.database());
    println!("{}", resolver.describe(&res.target));
    println!("  supplied by: {}", resolver.describe(&res.supplied_by));
    print_config(&res.config)?;
    for (field, source) in &res.field_sources {
        println!("  # {field} from {}", resolver.describe(source));
    }
    Ok(())
}

pub fn show_all(ctx: &Context) -> anyhow::Result<()> {
    let zones = ctx.admin.show_all()?;
    if ctx.json {
        return print_json(&zones);
    }
    for zone in &zones {
        println!("{}", describe_locator(&ctx.catalog, &zone.locator));
        print_config(&zone.config)?;
    }
    Ok(())
}

pub fn set(ctx: &Context, raw: &str, toml: &str, replace: bool) -> anyhow::Result<()> {
    let spec = parse_target(raw)?;
    let config = ZoneConfig::from_toml_str(toml)?;
    let update = if replace {
        ZoneUpdate::Replace(config)
    } else {
        ZoneUpdate::SetFields(config)
    };
    write(ctx, &spec, &update)
}

pub fn use_default(ctx: &Context, raw: &str) -> anyhow::Result<()> {
    let spec = parse_target(raw)?;
    write(ctx, &spec, &ZoneUpdate::UseDefault)
}

fn write(ctx: &Context, spec: &TargetSpec, update: &ZoneUpdate) -> anyhow::Result<()> {
    let outcome = ctx
        .admin
        .configure(&ctx.catalog, ctx.database(), spec, update)?;
    if ctx.json {
        return print_json(&outcome);
    }
    let resolver = TargetResolver::new(&ctx.catalog, ctx.database());
    for target in &outcome.targets {
        println!("✓ Configured {}", resolver.describe(target));
    }
    Ok(())
}

pub fn discard(ctx: &Context, raw: &str) -> anyhow::Result<()> {
    let spec = parse_target(raw)?;
    let outcome = ctx.admin.discard(&ctx.catalog, ctx.database(), &spec)?;
    if ctx.json {
        return print_json(&outcome);
    }
    let resolver = TargetResolver::new(&ctx.catalog, ctx.database());
    for target in &outcome.targets {
        println!("✓ Discarded {}", resolver.describe(target));
    }
    Ok(())
}

#[derive(Serialize)]
struct SpanRow {
    start: String,
    end: String,
    subzone: Option<String>,
}

pub fn spans(ctx: &Context, raw: &str) -> anyhow::Result<()> {
    let spec = parse_target(raw)?;
    let spans = ctx.admin.spans(&ctx.catalog, ctx.database(), &spec)?;
    let target = TargetResolver::new(&ctx.catalog, ctx.database()).resolve(&spec)?;
    let subzones = match target.table_id() {
        Some(id) => ctx.admin.store().get_subzones(id)?,
        None => anyhow::bail!("{spec} does not name a table"),
    };

    let rows: Vec<SpanRow> = spans
        .iter()
        .map(|span| SpanRow {
            start: pretty_key(&span.key),
            end: pretty_key(&span.end()),
            subzone: span
                .subzone_index
                .and_then(|i| subzones.iter().nth(i))
                .map(|s| describe_locator(&ctx.catalog, &s.locator(subzones.table_id))),
        })
        .collect();

    if ctx.json {
        return print_json(&rows);
    }
    for row in &rows {
        println!(
            "[{}, {})  {}",
            row.start,
            row.end,
            row.subzone.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
