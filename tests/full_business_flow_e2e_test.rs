// ==========================================
// 完整业务流程端到端集成测试
// ==========================================
// 目标: 验证从目录导入到计划导出的完整业务流程
// 覆盖: 导入 → 可用性预检 → 生成挂起 → 协商恢复 →
//       替换 → 调价 → 快照 → CSV 导出
// ==========================================


use promo_planner::domain::plan::assign_reason;
use promo_planner::domain::types::{CategoryChoice, PlanScope};
use promo_planner::logging;
use std::collections::HashMap;
use std::collections::HashSet;
use test_helpers::{create_test_product, create_test_state, write_catalog_csv};

const FIXTURE_CSV: &str = "tests/fixtures/test_catalog.csv";

#[tokio::test]
async fn test_full_promo_planning_flow() {
    logging::init_test();
    println!("\n=== 端到端集成测试：完整促销排期流程 ===\n");

    // === 步骤 1: 初始化 + 导入标准测试目录 ===
    let (_temp, state) = create_test_state().unwrap();
    let summary = state
        .catalog_api
        .import_catalog_file(FIXTURE_CSV)
        .await
        .unwrap();
    assert_eq!(summary.batch.imported_rows, 7, "标准目录应入库 7 个商品");
    assert_eq!(summary.error_count(), 2, "脏行应被丢弃并计数");
    assert_eq!(summary.warning_count(), 2);
    println!(
        "✓ 步骤 1: 目录导入完成（入库 {} / 丢弃 {} / 违规 {}）",
        summary.batch.imported_rows,
        summary.batch.skipped_rows,
        summary.violations.len()
    );

    // === 步骤 2: 补充导入生鲜分类 ===
    let fresh: Vec<_> = (1..=20)
        .map(|i| create_test_product(&format!("FRS{:03}", i), "生鲜", 1500 - i as i64, 239.0))
        .collect();
    let fresh_csv = write_catalog_csv(&fresh).unwrap();
    state
        .catalog_api
        .import_catalog_file(fresh_csv.path().to_str().unwrap())
        .await
        .unwrap();
    assert_eq!(state.catalog_api.product_count().unwrap(), 27);
    let categories = state.catalog_api.list_categories().unwrap();
    assert_eq!(categories.len(), 3);
    println!("✓ 步骤 2: 生鲜补充导入完成, 目录 {} 个商品, 分类 {:?}", 27, categories);

    // === 步骤 3: 可用性预检暴露短缺 ===
    let weekly_selections = vec![vec![CategoryChoice::literal("休闲零食")]; 7];
    let report = state
        .plan_api
        .validate_availability(&weekly_selections, PlanScope::Weekly, Some(1))
        .await
        .unwrap();
    assert!(!report.is_valid());
    assert_eq!(report.insufficient_categories, vec!["休闲零食"]);
    assert_eq!(report.required_by_category["休闲零食"], 7);
    assert_eq!(report.available_by_category["休闲零食"], 5);
    println!("✓ 步骤 3: 预检发现短缺（休闲零食 需求 7 > 供给 5）");

    // === 步骤 4: 生成挂起, 按建议协商恢复 ===
    let pending = state
        .plan_api
        .generate_weekly("2024-09-02", weekly_selections, Some(1))
        .await
        .unwrap()
        .pending()
        .unwrap();
    assert_eq!(pending.scope, PlanScope::Weekly);
    // 建议首位应是合格数最高的生鲜
    let best = pending.suggestions.first().unwrap();
    assert_eq!(best.choice, CategoryChoice::literal("生鲜"));
    assert_eq!(best.available_count, 20);

    let map = HashMap::from([("休闲零食".to_string(), best.choice.clone())]);
    let mut week = state
        .plan_api
        .resume_weekly(pending, &map)
        .await
        .unwrap()
        .ready()
        .unwrap();
    assert_eq!(week.total_items(), 7);
    assert!(week.days.iter().all(|d| d.items.len() == 1));
    assert_eq!(week.days[0].items[0].product_id(), "FRS001");
    println!("✓ 步骤 4: 协商恢复完成（休闲零食 → 生鲜, {} 个商品）", week.total_items());

    // === 步骤 5: 自动替换 + 人工替换 ===
    let auto = state.plan_api.auto_replace_in_week(&mut week, 0, 0).await.unwrap();
    assert_eq!(auto.replaced.product_id, "FRS001");
    assert_eq!(auto.replacement.product_id, "FRS008", "自动替换应取同分类最热未用商品");

    let manual = state
        .plan_api
        .manual_replace_in_week(&mut week, 1, 0, "SKU001")
        .await
        .unwrap();
    assert_eq!(manual.replacement.product_id, "SKU001");
    assert_eq!(
        week.days[1].items[0].assign_reason,
        assign_reason::MANUAL_REPLACEMENT
    );

    let ids = week.product_ids();
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), 7, "替换后周内仍不得重复");
    println!("✓ 步骤 5: 替换完成（自动 → FRS008, 人工 → SKU001）");

    // === 步骤 6: 促销价调整 ===
    state
        .plan_api
        .override_price_in_week(&mut week, 2, 0, 199.0)
        .unwrap();
    let adjusted = &week.days[2].items[0];
    assert_eq!(adjusted.effective_price(), 199.0);
    assert!(adjusted.custom_margin_percent.is_some());
    println!("✓ 步骤 6: 促销价调整完成（{} → 199.00）", adjusted.product_id());

    // === 步骤 7: 快照保存与原样载入 ===
    let snapshot = state
        .plan_api
        .save_week_snapshot(&week, "9月第1周促销")
        .unwrap();
    let listed = state.plan_api.list_snapshots(Some(PlanScope::Weekly)).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].plan_label, "9月第1周促销");

    let loaded = state.plan_api.load_week_snapshot(&snapshot.snapshot_id).unwrap();
    assert_eq!(loaded, week, "快照载入应与保存时完全一致");
    println!("✓ 步骤 7: 快照保存并原样载入（id={}）", snapshot.snapshot_id);

    // === 步骤 8: CSV 导出 ===
    let export_dir = tempfile::tempdir().unwrap();
    let export_path = export_dir.path().join("周计划导出.csv");
    let row_count = state
        .plan_api
        .export_week_csv(&week, export_path.to_str().unwrap())
        .unwrap();
    assert_eq!(row_count, 7);

    let content = std::fs::read_to_string(&export_path).unwrap();
    let line_count = content.lines().count();
    assert_eq!(line_count, 8, "表头 + 7 行数据");
    assert!(content.contains("自动替换"));
    assert!(content.contains("人工替换"));
    assert!(content.contains("199.00"));
    println!("✓ 步骤 8: CSV 导出完成（{} 行数据）", row_count);

    println!("\n=== 完整促销排期流程测试通过 ✅ ===");
    println!("  - 目录商品: {} 个", state.catalog_api.product_count().unwrap());
    println!("  - 周计划商品: {} 个", week.total_items());
    println!("  - 快照: {} 份", listed.len());
}

#[tokio::test]
async fn test_monthly_flow_with_random_fallback() {
    logging::init_test();
    println!("\n=== 端到端集成测试：月计划随机兜底流程 ===\n");

    let (_temp, state) = create_test_state().unwrap();
    let catalog: Vec<_> = (1..=50)
        .map(|i| create_test_product(&format!("MIX{:03}", i), "百货", 5000 - i as i64, 219.0))
        .collect();
    let csv = write_catalog_csv(&catalog).unwrap();
    state
        .catalog_api
        .import_catalog_file(csv.path().to_str().unwrap())
        .await
        .unwrap();
    println!("✓ 步骤 1: 导入 50 个百货商品");

    // 2024-09 覆盖 6 个自然周（9月1日是周日）
    let starts = state.plan_api.month_week_starts(2024, 9).unwrap();
    assert_eq!(starts.len(), 6);

    // 每周 [随机] 配额 1 → 42 天每天 1 个, 跨周不重复
    let month = state
        .plan_api
        .generate_monthly(2024, 9, vec![vec![CategoryChoice::Random]; 6], Some(1))
        .await
        .unwrap()
        .ready()
        .unwrap();
    assert_eq!(month.total_days(), 42);
    assert_eq!(month.total_items(), 42);
    let ids = month.product_ids();
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), 42, "整月随机选品不得重复");
    assert!(month
        .weeks
        .iter()
        .flat_map(|w| w.days.iter())
        .flat_map(|d| d.items.iter())
        .all(|i| i.assign_reason == assign_reason::RANDOM_POOL));
    println!("✓ 步骤 2: 月计划生成（{} 周 / {} 天）", month.weeks.len(), month.total_days());

    // 月快照往返
    let snapshot = state.plan_api.save_month_snapshot(&month, "9月整月随机").unwrap();
    let loaded = state.plan_api.load_month_snapshot(&snapshot.snapshot_id).unwrap();
    assert_eq!(loaded.total_items(), 42);
    println!("✓ 步骤 3: 月快照保存与载入");

    // 月计划导出
    let export_dir = tempfile::tempdir().unwrap();
    let export_path = export_dir.path().join("月计划导出.csv");
    let row_count = state
        .plan_api
        .export_month_csv(&month, export_path.to_str().unwrap())
        .unwrap();
    assert_eq!(row_count, 42);
    println!("✓ 步骤 4: 月计划导出（{} 行）", row_count);

    println!("\n=== 月计划随机兜底流程测试通过 ✅ ===");
}
