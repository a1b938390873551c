// 端到端演示: 导入目录 → 周计划生成 → 短缺协商 → 人工替换 → 快照 → 导出。
//
// Usage:
//   cargo run --bin plan_demo -- [db_path]
//
// 不传 db_path 时使用系统临时目录下的演示库（每次运行重置）。

use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use csv::Writer;

use promo_planner::app::AppState;
use promo_planner::domain::types::CategoryChoice;
use promo_planner::engine::GenerationOutcome;
use promo_planner::i18n::{t, t_with_args};

// 演示目录构成: 饮料供给刻意不足, 触发替代协商流程
const SNACK_COUNT: usize = 30;
const DRINK_COUNT: usize = 4;
const FRESH_COUNT: usize = 25;

fn write_demo_catalog(path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record([
        "商品编号",
        "商品名称",
        "商品分类",
        "品牌",
        "供应商",
        "浏览量",
        "销售价",
        "采购成本",
        "库存状态",
    ])?;

    for i in 0..SNACK_COUNT {
        wtr.write_record([
            &format!("SNK{:03}", i + 1),
            &format!("坚果礼盒 {} 号", i + 1),
            "零食",
            "坚果工坊",
            "华东供应链",
            &format!("{}", 3000 - i * 20),
            &format!("{:.1}", 259.0 + i as f64),
            &format!("{:.1}", 150.0 + i as f64),
            "InStock",
        ])?;
    }
    for i in 0..DRINK_COUNT {
        wtr.write_record([
            &format!("DRK{:03}", i + 1),
            &format!("气泡水 {} 箱装", i + 1),
            "饮料",
            "水源",
            "华南供应链",
            &format!("{}", 2000 - i * 50),
            "219.0",
            "120.0",
            "LowStock",
        ])?;
    }
    for i in 0..FRESH_COUNT {
        wtr.write_record([
            &format!("FRS{:03}", i + 1),
            &format!("当季水果拼盒 {}", i + 1),
            "生鲜",
            "果园直采",
            "冷链仓",
            &format!("{}", 1500 - i * 10),
            &format!("{:.1}", 239.0 + i as f64),
            &format!("{:.1}", 130.0 + i as f64),
            "InStock",
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    promo_planner::logging::init();

    let demo_dir = std::env::temp_dir();
    let db_path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            let path = demo_dir.join("promo_planner_demo.db");
            // 演示每次从干净库开始
            let _ = std::fs::remove_file(&path);
            path.to_string_lossy().to_string()
        }
    };

    println!("==================================================");
    println!("{} - 端到端演示", promo_planner::APP_NAME);
    println!("==================================================");

    let state = AppState::new(db_path)?;

    // 1. 导入演示目录
    let catalog_path = demo_dir.join("promo_planner_demo_catalog.csv");
    write_demo_catalog(&catalog_path)?;
    let summary = state
        .catalog_api
        .import_catalog_file(&catalog_path.to_string_lossy())
        .await?;
    println!(
        "\n[1] 目录导入: 共 {} 行, 入库 {}, 丢弃 {}, 质量告警 {}",
        summary.batch.total_rows,
        summary.batch.imported_rows,
        summary.batch.skipped_rows,
        summary.warning_count()
    );

    // 2. 周计划生成: 每天 [零食, 饮料], 饮料供给不足
    let selections: Vec<Vec<CategoryChoice>> = (0..7)
        .map(|_| vec![CategoryChoice::literal("零食"), CategoryChoice::literal("饮料")])
        .collect();
    let outcome = state
        .plan_api
        .generate_weekly("2024-07-01", selections, Some(3))
        .await?;

    let pending = match outcome {
        GenerationOutcome::Ready(_) => {
            println!("[2] 意外: 未触发短缺（演示数据应使饮料不足）");
            return Ok(());
        }
        GenerationOutcome::NeedsResolution(pending) => {
            println!("\n[2] {}", t("plan.needs_resolution"));
            for category in pending.report.failing_categories() {
                let available = pending
                    .report
                    .available_by_category
                    .get(&category)
                    .copied()
                    .unwrap_or(0);
                let required = pending
                    .report
                    .required_by_category
                    .get(&category)
                    .copied()
                    .unwrap_or(0);
                println!("    短缺分类: {} (可用 {}, 需求 {})", category, available, required);
            }
            println!("    替代建议:");
            for suggestion in &pending.suggestions {
                println!(
                    "      {} (可用 {})",
                    suggestion.choice.display_name(),
                    suggestion.available_count
                );
            }
            pending
        }
    };

    // 3. 协商确认: 饮料 → 生鲜（替代建议中库存充足的分类）
    let mut replacement_map = HashMap::new();
    replacement_map.insert("饮料".to_string(), CategoryChoice::literal("生鲜"));
    println!("\n[3] 替代协商确认: 饮料 → 生鲜, 恢复生成");

    let mut week = state
        .plan_api
        .resume_weekly(pending, &replacement_map)
        .await?
        .ready()
        .ok_or("恢复生成后仍有短缺")?;

    println!("    {}", t("plan.generated"));
    println!(
        "    第{}周: {} ~ {}, 共 {} 个商品",
        week.week_number,
        week.start_date,
        week.end_date,
        week.total_items()
    );
    for day in &week.days {
        let names: Vec<&str> = day
            .items
            .iter()
            .map(|item| item.product.product_name.as_str())
            .collect();
        println!("    {} {}: {}", day.slot_date, day.day_name, names.join(" / "));
    }

    // 4. 人工操作: 自动替换周一首个商品 + 改价
    let response = state.plan_api.auto_replace_in_week(&mut week, 0, 0).await?;
    println!(
        "\n[4] 自动替换: {} → {}",
        response.replaced.product_name, response.replacement.product_name
    );
    state
        .plan_api
        .override_price_in_week(&mut week, 0, 0, 199.0)?;
    println!("    改价: {} 促销价调整为 199.00", week.days[0].items[0].product.product_name);

    // 5. 快照保存
    let snapshot = state.plan_api.save_week_snapshot(&week, "演示周计划")?;
    println!("\n[5] 快照已保存: {} ({})", snapshot.plan_label, snapshot.snapshot_id);

    // 6. 导出 CSV
    let export_path = demo_dir.join("promo_planner_demo_week.csv");
    let rows = state
        .plan_api
        .export_week_csv(&week, &export_path.to_string_lossy())?;
    println!(
        "\n[6] {} ({} 行)",
        t_with_args(
            "export.completed",
            &[("path", &export_path.display().to_string())]
        ),
        rows
    );

    println!("\n演示完成。");
    Ok(())
}
