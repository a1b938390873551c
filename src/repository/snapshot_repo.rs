// ==========================================
// 零售促销排期系统 - 计划快照仓储
// ==========================================
// 职责: plan_snapshot 表的数据访问
// 说明: 计划整体以 JSON 载荷存取, 结构演进不动表结构
// ==========================================

use crate::domain::plan::PlanSnapshot;
use crate::domain::types::PlanScope;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// PlanSnapshotRepository
// ==========================================
pub struct PlanSnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanSnapshotRepository {
    /// 创建新的 Repository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        crate::db::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 复用已有连接
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存计划快照
    ///
    /// # 参数
    /// - scope: 计划范围
    /// - label: 人工命名（如 "7月第一版"）
    /// - payload_json: 计划序列化载荷
    pub fn save(
        &self,
        scope: PlanScope,
        label: &str,
        payload_json: &str,
    ) -> RepositoryResult<PlanSnapshot> {
        let snapshot = PlanSnapshot {
            snapshot_id: Uuid::new_v4().to_string(),
            plan_scope: scope,
            plan_label: label.to_string(),
            payload_json: payload_json.to_string(),
            created_at: chrono::Local::now().naive_local(),
        };

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO plan_snapshot (
                snapshot_id, plan_scope, plan_label, payload_json, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                snapshot.snapshot_id,
                snapshot.plan_scope.to_db_str(),
                snapshot.plan_label,
                snapshot.payload_json,
                snapshot.created_at.format(TIMESTAMP_FMT).to_string(),
            ],
        )?;
        Ok(snapshot)
    }

    /// 按 ID 读取快照
    pub fn find_by_id(&self, snapshot_id: &str) -> RepositoryResult<PlanSnapshot> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT snapshot_id, plan_scope, plan_label, payload_json, created_at
             FROM plan_snapshot WHERE snapshot_id = ?1",
            params![snapshot_id],
            Self::map_snapshot_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "PlanSnapshot".to_string(),
                id: snapshot_id.to_string(),
            },
            other => other.into(),
        })
    }

    /// 快照列表（新到旧）, scope 为 None 时不过滤范围
    pub fn list(&self, scope: Option<PlanScope>) -> RepositoryResult<Vec<PlanSnapshot>> {
        let conn = self.get_conn()?;
        let mut snapshots = Vec::new();
        match scope {
            Some(s) => {
                let mut stmt = conn.prepare(
                    "SELECT snapshot_id, plan_scope, plan_label, payload_json, created_at
                     FROM plan_snapshot WHERE plan_scope = ?1
                     ORDER BY created_at DESC, snapshot_id DESC",
                )?;
                let rows = stmt.query_map(params![s.to_db_str()], Self::map_snapshot_row)?;
                for row in rows {
                    snapshots.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT snapshot_id, plan_scope, plan_label, payload_json, created_at
                     FROM plan_snapshot
                     ORDER BY created_at DESC, snapshot_id DESC",
                )?;
                let rows = stmt.query_map([], Self::map_snapshot_row)?;
                for row in rows {
                    snapshots.push(row?);
                }
            }
        }
        Ok(snapshots)
    }

    /// 删除快照, 返回删除行数
    pub fn delete(&self, snapshot_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count = conn.execute(
            "DELETE FROM plan_snapshot WHERE snapshot_id = ?1",
            params![snapshot_id],
        )?;
        Ok(count)
    }

    /// 行映射: plan_snapshot → PlanSnapshot
    fn map_snapshot_row(row: &Row) -> rusqlite::Result<PlanSnapshot> {
        let scope_raw: String = row.get(1)?;
        let created_at_raw: String = row.get(4)?;
        Ok(PlanSnapshot {
            snapshot_id: row.get(0)?,
            plan_scope: PlanScope::from_db_str(&scope_raw).unwrap_or(PlanScope::Daily),
            plan_label: row.get(2)?,
            payload_json: row.get(3)?,
            created_at: NaiveDateTime::parse_from_str(&created_at_raw, TIMESTAMP_FMT)
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_repo() -> PlanSnapshotRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        PlanSnapshotRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_save_and_find() {
        let repo = create_test_repo();
        let saved = repo
            .save(PlanScope::Weekly, "7月第一周", r#"{"week_number":27}"#)
            .unwrap();
        assert!(!saved.snapshot_id.is_empty());

        let found = repo.find_by_id(&saved.snapshot_id).unwrap();
        assert_eq!(found.plan_scope, PlanScope::Weekly);
        assert_eq!(found.plan_label, "7月第一周");
        assert_eq!(found.payload_json, r#"{"week_number":27}"#);
    }

    #[test]
    fn test_find_missing_returns_not_found() {
        let repo = create_test_repo();
        assert!(matches!(
            repo.find_by_id("nope"),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_filters_by_scope() {
        let repo = create_test_repo();
        repo.save(PlanScope::Daily, "日计划A", "{}").unwrap();
        repo.save(PlanScope::Weekly, "周计划B", "{}").unwrap();
        repo.save(PlanScope::Weekly, "周计划C", "{}").unwrap();

        let all = repo.list(None).unwrap();
        assert_eq!(all.len(), 3);

        let weekly = repo.list(Some(PlanScope::Weekly)).unwrap();
        assert_eq!(weekly.len(), 2);
        assert!(weekly.iter().all(|s| s.plan_scope == PlanScope::Weekly));
    }

    #[test]
    fn test_delete() {
        let repo = create_test_repo();
        let saved = repo.save(PlanScope::Monthly, "7月", "{}").unwrap();
        assert_eq!(repo.delete(&saved.snapshot_id).unwrap(), 1);
        assert_eq!(repo.delete(&saved.snapshot_id).unwrap(), 0);
        assert!(repo.list(None).unwrap().is_empty());
    }
}
