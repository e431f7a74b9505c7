//! 监听器注册表
//!
//! 维护按订阅顺序排列的位置变更监听器，支持注册、移除和同步扇出通知。
//!
//! 通知采用快照语义：每次通知遍历的是当时已注册监听器的快照，
//! 通知过程中新增或移除的监听器不影响本次通知的集合，
//! 因此监听器可以在回调中安全地注册或注销（包括注销自己）。

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::history::location::{Action, Location};
use crate::utils::generate_key;

/// 监听器注册 ID 长度
const LISTENER_ID_LENGTH: usize = 8;

/// 位置变更回调函数类型
///
/// 回调在导航提交线程上同步调用，收到目标位置和引发变更的动作。
pub type ListenerCallback = Arc<dyn Fn(&Location, Action) + Send + Sync>;

/// 内部监听器条目
#[derive(Clone)]
struct ListenerEntry {
    /// 注册唯一标识
    listener_id: String,

    /// 变更回调函数
    callback: ListenerCallback,

    /// 注册时间（用于调试和审计）
    #[allow(dead_code)]
    subscribed_at: DateTime<Utc>,
}

/// 通知统计信息
#[derive(Debug, Clone, Default)]
pub struct NotifyStats {
    /// 总通知轮次
    pub notifications: u64,

    /// 累计触达的监听器次数
    pub deliveries: u64,

    /// 最后通知时间
    pub last_notified_at: Option<DateTime<Utc>>,
}

/// 监听器注册表
///
/// 注册顺序即通知顺序；同一个回调可以注册多次，不做去重。
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    /// 监听器列表（按注册顺序）
    listeners: Arc<RwLock<Vec<ListenerEntry>>>,

    /// 通知统计
    stats: Arc<RwLock<NotifyStats>>,
}

impl ListenerRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册监听器
    ///
    /// # Returns
    ///
    /// 返回 [`Unlisten`] 句柄，用于后续注销该监听器
    pub fn subscribe(&self, callback: ListenerCallback) -> Unlisten {
        let entry = ListenerEntry {
            listener_id: generate_key(LISTENER_ID_LENGTH),
            callback,
            subscribed_at: Utc::now(),
        };
        let listener_id = entry.listener_id.clone();

        {
            let mut listeners = self.listeners.write().unwrap();
            listeners.push(entry);
        }

        debug!(listener_id = %listener_id, "注册位置监听器");

        Unlisten {
            listener_id,
            listeners: Arc::clone(&self.listeners),
        }
    }

    /// 通知所有监听器
    ///
    /// 按注册顺序同步调用每个监听器。先在锁内取得当前监听器快照，
    /// 再在锁外依次调用，保证回调可重入注册表。
    pub fn notify(&self, location: &Location, action: Action) {
        let snapshot: Vec<ListenerEntry> = {
            let listeners = self.listeners.read().unwrap();
            listeners.clone()
        };

        trace!(
            action = %action,
            pathname = %location.pathname,
            listener_count = snapshot.len(),
            "扇出位置变更通知"
        );

        for entry in &snapshot {
            (entry.callback)(location, action);
        }

        let mut stats = self.stats.write().unwrap();
        stats.notifications += 1;
        stats.deliveries += snapshot.len() as u64;
        stats.last_notified_at = Some(Utc::now());
    }

    /// 当前注册的监听器数量
    pub fn len(&self) -> usize {
        self.listeners.read().unwrap().len()
    }

    /// 注册表是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 获取通知统计快照
    pub fn stats(&self) -> NotifyStats {
        self.stats.read().unwrap().clone()
    }
}

/// 注销句柄
///
/// 按注册 ID 移除对应监听器。移除时重新定位当前下标而不是缓存下标，
/// 重复调用是无操作，通知期间的并发移除不会影响无关条目。
pub struct Unlisten {
    listener_id: String,
    listeners: Arc<RwLock<Vec<ListenerEntry>>>,
}

impl Unlisten {
    /// 注销监听器（幂等）
    pub fn unlisten(&self) {
        let mut listeners = self.listeners.write().unwrap();
        let before = listeners.len();
        listeners.retain(|e| e.listener_id != self.listener_id);

        if listeners.len() < before {
            debug!(listener_id = %self.listener_id, "注销位置监听器");
        }
    }
}
