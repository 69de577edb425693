use std::path::PathBuf;

use crate::core::Config;
use crate::message::MessageHandler;
use crate::utils::AppError;
use shared::catalog::ComponentRegistration;
use shared::message::{InboundMessage, InboundPayload, MessageSource};

/// 组件注册器 - 本地组件目录的唯一写入者
///
/// # 注册流程
///
/// ```text
/// 1. 批处理入口完成身份解析 + 云端激活
/// 2. 构造注册消息 {"n": <组件名>, "t": <是否入目录>}
/// 3. 经由共享的消息处理器投递云端
/// 4. 投递确认后才更新目录文件 (整体覆写)
/// ```
///
/// 注册与重置都是一次性的 CLI 流程，在监听器未运行的进程里
/// 执行，因此目录文件没有并发写入者。
#[derive(Debug, Clone)]
pub struct ComponentRegistrar {
    catalog_path: PathBuf,
}

impl ComponentRegistrar {
    pub fn new(config: &Config) -> Self {
        Self {
            catalog_path: config.catalog_path(),
        }
    }

    /// 注册一个组件
    ///
    /// 云端投递失败时直接返回错误，目录文件保持不变:
    /// 投递确认就是这个调用的全部意义。
    pub async fn register(
        &self,
        handler: &MessageHandler,
        name: &str,
        cataloged: bool,
    ) -> Result<ComponentRegistration, AppError> {
        let inbound = InboundMessage::new(
            InboundPayload::registration(name, cataloged),
            MessageSource::local(),
        );
        handler.process(inbound).await?;

        // 云端已确认，更新本地目录
        let record = ComponentRegistration::new(name, cataloged);
        let mut records = self.load()?;
        match records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.persist(&records)?;

        tracing::info!(
            component = %record.name,
            cataloged = record.cataloged,
            "Component registered"
        );
        Ok(record)
    }

    /// 清空目录文件为空序列
    ///
    /// 幂等; 文件不存在时同样成立; 从不触碰云端。
    pub fn reset(&self) -> Result<(), AppError> {
        self.persist(&[])?;
        tracing::info!("Component catalog reset");
        Ok(())
    }

    /// 读取目录 (文件不存在视为空目录)
    pub fn load(&self) -> Result<Vec<ComponentRegistration>, AppError> {
        let raw = match std::fs::read(&self.catalog_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::internal(format!(
                    "Cannot read catalog {}: {e}",
                    self.catalog_path.display()
                )));
            }
        };

        serde_json::from_slice(&raw).map_err(|e| {
            AppError::internal(format!(
                "Corrupt catalog {}: {e}",
                self.catalog_path.display()
            ))
        })
    }

    /// 整体覆写目录文件 (从不追加)
    fn persist(&self, records: &[ComponentRegistration]) -> Result<(), AppError> {
        if let Some(parent) = self.catalog_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::internal(format!("Cannot create catalog dir: {e}"))
            })?;
        }

        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| AppError::internal(format!("Cannot serialize catalog: {e}")))?;
        std::fs::write(&self.catalog_path, json).map_err(|e| {
            AppError::internal(format!(
                "Cannot write catalog {}: {e}",
                self.catalog_path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registrar_in(dir: &tempfile::TempDir) -> ComponentRegistrar {
        let config = Config::with_overrides(dir.path().to_str().unwrap(), 0, 0);
        ComponentRegistrar::new(&config)
    }

    #[test]
    fn test_load_missing_catalog_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registrar = registrar_in(&dir);
        assert!(registrar.load().unwrap().is_empty());
    }

    #[test]
    fn test_reset_on_missing_file_creates_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let registrar = registrar_in(&dir);

        registrar.reset().unwrap();
        assert!(registrar.load().unwrap().is_empty());

        // 幂等
        registrar.reset().unwrap();
        assert!(registrar.load().unwrap().is_empty());
    }

    #[test]
    fn test_reset_truncates_populated_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let registrar = registrar_in(&dir);

        registrar
            .persist(&[ComponentRegistration::new("temp-sensor", true)])
            .unwrap();
        assert_eq!(registrar.load().unwrap().len(), 1);

        registrar.reset().unwrap();
        let raw = std::fs::read_to_string(registrar.catalog_path.clone()).unwrap();
        assert_eq!(raw, "[]");
    }

    #[test]
    fn test_persist_overwrites_rather_than_appends() {
        let dir = tempfile::tempdir().unwrap();
        let registrar = registrar_in(&dir);

        registrar
            .persist(&[
                ComponentRegistration::new("a", true),
                ComponentRegistration::new("b", false),
            ])
            .unwrap();
        registrar
            .persist(&[ComponentRegistration::new("a", false)])
            .unwrap();

        let records = registrar.load().unwrap();
        assert_eq!(records, vec![ComponentRegistration::new("a", false)]);
    }
}
