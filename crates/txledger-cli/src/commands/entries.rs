use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use txledger_core::{RetentionMetadata, Transaction, Value};

use crate::app::AppContext;
use crate::cli::{InfoArgs, LoadArgs, ModifyArgs};
use crate::commands::for_each_customer;
use crate::helpers::{now_epoch, parse_path, parse_shape};
use crate::output::{entries_table, infos_json, summary_table, LedgerInfo};

/// Transactions generated by `load`: ids count down from `base_id`, so the
/// smallest id is the newest.
fn generate_batch(
    args: &LoadArgs,
    shape: txledger_core::ValueShape,
    now: f64,
) -> anyhow::Result<Vec<(i64, Value)>> {
    if !args.interval.is_finite() {
        return Err(anyhow::anyhow!("Interval must be finite: {}", args.interval));
    }
    if let Some(start_ts) = args.start_ts.filter(|ts| !ts.is_finite()) {
        return Err(anyhow::anyhow!("Start timestamp must be finite: {}", start_ts));
    }
    let start_ts = args
        .start_ts
        .unwrap_or(now - args.interval * args.count as f64);

    (0..args.count)
        .map(|step| {
            let id = i64::try_from(step)
                .ok()
                .and_then(|offset| args.base_id.checked_sub(offset))
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "Cannot generate {} ids below base id {}",
                        args.count,
                        args.base_id
                    )
                })?;
            let ts = start_ts + args.interval * step as f64;
            if !ts.is_finite() {
                return Err(anyhow::anyhow!("Timestamp of transaction {} overflows", id));
            }
            let txn = Transaction::new(ts, args.amount).with_label(format!("txn-{}", id));
            Ok((id, txn.encode(shape)))
        })
        .collect()
}

pub fn handle_load(ctx: &AppContext, args: &LoadArgs) -> anyhow::Result<()> {
    let shape = match args.shape.as_deref() {
        Some(name) => parse_shape(name)?,
        None => ctx.settings()?.ledger.shape,
    };
    let batch = generate_batch(args, shape, now_epoch())?;
    let retention = args
        .floor
        .map(RetentionMetadata::with_floor)
        .unwrap_or_default();
    let ledger = ctx.open_ledger()?;

    let customers = ctx.customers()?;
    let progress = if ctx.quiet() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(customers.len() as u64)
    };
    progress.set_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
            .map_err(|e| anyhow::anyhow!("Progress template error: {}", e))?,
    );

    let quiet = ctx.quiet();
    let result = for_each_customer(ctx, |customer| {
        progress.set_message(customer.to_string());
        let size = ledger.append_batch(customer, &batch, retention);
        progress.inc(1);
        let size = size?;
        if !quiet {
            progress.suspend(|| {
                println!(
                    "Loaded {} transactions for {} (size {})",
                    batch.len(),
                    customer,
                    size
                )
            });
        }
        Ok(())
    });
    progress.finish_and_clear();
    result.map(|_| ())
}

pub fn handle_modify(ctx: &AppContext, args: &ModifyArgs) -> anyhow::Result<()> {
    let explicit_path = args.path.as_deref().map(parse_path).transpose()?;
    let ledger = ctx.open_ledger()?;
    let default_shape = ledger.config().default_shape;

    for_each_customer(ctx, |customer| {
        let path = match &explicit_path {
            Some(path) => path.clone(),
            None => ledger
                .shape(customer)?
                .unwrap_or(default_shape)
                .amount_path(),
        };
        let updated = ledger.mutate_numeric(
            customer,
            args.id,
            &path,
            args.select.into(),
            args.delta,
            args.clamp,
        )?;
        if !ctx.quiet() {
            let values: Vec<String> = updated.iter().map(i64::to_string).collect();
            println!(
                "Modified transaction {} of {} at {}: {}",
                args.id,
                customer,
                path,
                values.join(", ")
            );
        }
        Ok(())
    })
    .map(|_| ())
}

pub fn handle_info(ctx: &AppContext, args: &InfoArgs) -> anyhow::Result<()> {
    let explicit_path = args.path.as_deref().map(parse_path).transpose()?;
    let ledger = ctx.open_ledger()?;
    let default_shape = ledger.config().default_shape;

    let mut infos = Vec::new();
    for_each_customer(ctx, |customer| {
        let shape = ledger.shape(customer)?;
        let path = match &explicit_path {
            Some(path) => path.clone(),
            None => shape.unwrap_or(default_shape).amount_path(),
        };
        let entries = match args.entries {
            Some(limit) => ledger.range_scan(customer, 0, limit)?,
            None => Vec::new(),
        };
        infos.push(LedgerInfo {
            customer: customer.to_string(),
            shape,
            size: ledger.size(customer)?,
            next_id: ledger.next_id(customer)?,
            aggregate: ledger.aggregate(customer, &path)?,
            entries,
        });
        debug!(customer, "collected ledger info");
        Ok(())
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&infos_json(&infos))?);
        return Ok(());
    }
    if infos.is_empty() {
        return Ok(());
    }

    println!("{}", summary_table(&infos));
    if args.entries.is_some() {
        for info in &infos {
            println!("\n{}", info.customer);
            println!("{}", entries_table(info));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use txledger_core::ValueShape;

    fn load_args(start_ts: Option<f64>) -> LoadArgs {
        LoadArgs {
            count: 3,
            base_id: 100,
            start_ts,
            interval: 10.0,
            amount: 7,
            shape: None,
            floor: None,
        }
    }

    #[test]
    fn test_generated_ids_count_down_with_rising_timestamps() {
        let batch = generate_batch(&load_args(Some(500.0)), ValueShape::List, 0.0).unwrap();
        let ids: Vec<i64> = batch.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![100, 99, 98]);

        let newest = Transaction::decode(&batch[2].1).unwrap();
        assert_eq!(newest.timestamp, 520.0);
        assert_eq!(newest.amount, 7);
        assert_eq!(newest.label.as_deref(), Some("txn-98"));
    }

    #[test]
    fn test_ids_below_i64_min_are_an_error() {
        let mut args = load_args(Some(0.0));
        args.base_id = i64::MIN + 1;
        let err = generate_batch(&args, ValueShape::List, 0.0).unwrap_err();
        assert!(err.to_string().contains("Cannot generate 3 ids"));

        args.count = 2;
        let batch = generate_batch(&args, ValueShape::List, 0.0).unwrap();
        assert_eq!(batch[1].0, i64::MIN);
    }

    #[test]
    fn test_non_finite_times_are_an_error() {
        let err = generate_batch(&load_args(Some(f64::INFINITY)), ValueShape::List, 0.0)
            .unwrap_err();
        assert!(err.to_string().contains("Start timestamp must be finite"));

        let mut args = load_args(Some(0.0));
        args.interval = f64::NAN;
        assert!(generate_batch(&args, ValueShape::List, 0.0).is_err());

        args.interval = f64::MAX;
        let err = generate_batch(&args, ValueShape::List, 0.0).unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_default_start_ends_before_now() {
        let batch = generate_batch(&load_args(None), ValueShape::Map, 1_000.0).unwrap();
        let oldest = Transaction::decode(&batch[0].1).unwrap();
        assert_eq!(oldest.timestamp, 970.0);
    }
}
