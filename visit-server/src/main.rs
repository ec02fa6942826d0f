use visit_server::auth::require_jwt_secret;
use visit_server::db::DbService;
use visit_server::db::repository::staff;
use visit_server::utils::validation::validate_required_text;
use visit_server::{Config, Server, ServerState, print_banner, setup_environment};

/// 为员工签发访问令牌: `visit-server issue-token <username>`
///
/// 员工登录不在本服务范围内，运维通过此命令发放令牌。
/// 必须设置 `JWT_SECRET`，临时密钥签出的令牌在服务端无法验证。
async fn issue_token(config: &Config, username: &str) -> Result<(), Box<dyn std::error::Error>> {
    validate_required_text(username, "username", 64)?;
    let mut config = config.clone();
    config.jwt.secret = require_jwt_secret()?;
    let db = DbService::new(&config.database_path().to_string_lossy()).await?;
    let state = ServerState::from_db(config, db);

    let user = staff::find_user_by_username(state.pool(), username)
        .await?
        .ok_or_else(|| format!("Staff user '{username}' not found"))?;
    if !user.is_active {
        return Err(format!("Staff user '{username}' is disabled").into());
    }

    let token = state.get_jwt_service().generate_token(user.id, &user.username)?;
    println!("{token}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 设置环境 (dotenv, 日志)
    setup_environment()?;

    // 2. 加载配置
    let config = Config::from_env()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [command, username] = args.as_slice()
        && command == "issue-token"
    {
        std::fs::create_dir_all(&config.work_dir)?;
        return issue_token(&config, username).await;
    }

    // 打印横幅
    print_banner();

    tracing::info!("Visit server starting...");

    // 3. 启动 HTTP 服务器 (Server::run 初始化状态并启动后台任务)
    let server = Server::new(config);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
