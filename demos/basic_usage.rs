//! 基本用法演示
//!
//! 展示导航引擎的完整流程：配置、监听、阻塞、导航与路径匹配。
//!
//! 运行方式：`cargo run --example basic_usage`

use std::sync::Arc;

use compass_core::matcher::{MatchOptions, PathMatcher};
use compass_core::{
    CompassConfig, HistoryController, Logger, LoggerConfig, MemoryHistory, UserConfirmation,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 构建配置
    let config = CompassConfig::builder()
        .basename("/app")
        .log_level("debug")
        .cache_capacity(256)
        .build()?;

    // 按配置初始化日志
    let _guard = Logger::init(LoggerConfig::from_log_config(&config.logging))?;

    // 确认回调：实际应用中这里会弹出对话框，演示里直接放行
    let confirmation: UserConfirmation = Arc::new(|message, decision| {
        println!("确认离开？({})", message);
        decision.allow();
    });

    let backend = Arc::new(MemoryHistory::new("/app/"));
    let history = HistoryController::with_confirmation(backend, config.history, confirmation);

    // 订阅位置变更
    let unlisten = history.listen(|location, action| {
        println!(
            "[{}] {}{}{}",
            action, location.pathname, location.search, location.hash
        );
    });

    // 普通导航
    history.push("/news/10?page=2#comments", None);
    history.push("/about", None);
    history.go_back();

    // 设置守卫后的导航需要确认
    let unblock = history.block("有未保存的修改");
    history.push("/profile", None);
    unblock.unblock();

    // 路径匹配：缓存容量来自配置
    let matcher = PathMatcher::with_cache_capacity(config.matcher.cache_capacity);
    let location = history.location();
    if let Some(matched) = matcher.match_path(&location.pathname, "/news/:id", MatchOptions::new())? {
        println!(
            "命中 {}，id = {}",
            matched.path,
            matched.param("id").unwrap_or("-")
        );
    } else {
        println!("当前位置 {} 未命中 /news/:id", location.pathname);
    }

    unlisten.unlisten();
    Ok(())
}
