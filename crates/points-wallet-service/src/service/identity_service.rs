//! 身份服务
//!
//! 注册、登录与当前会话管理。其他服务只接收已认证的用户 ID，不再校验凭据。
//!
//! 注册时以下写入在同一批次中提交：
//! - 用户记录
//! - 邮箱索引（要求不存在，保证邮箱唯一）
//! - 角色计数器（以版本为条件，保证展示编号不重复）
//! - 当前会话

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use points_shared::config::AuthConfig;
use points_shared::retry::{RetryPolicy, retry_with_policy};

use crate::auth::{JwtConfig, JwtManager, hash_password, verify_password};
use crate::error::{PointsError, Result};
use crate::models::{
    DisplayIdCounter, EmailIndexEntry, Role, Session, User, UserProfile, normalize_email,
    parse_display_seq,
};
use crate::service::dto::{AuthSession, ProfileUpdate, RegisterRequest};
use crate::store::{EntityKind, EntityRepository, Expect, WriteBatch};

/// 读取角色计数器
///
/// 计数器不存在时按现有同角色用户推导初值，并要求以「不存在」为条件写入
pub(crate) async fn load_counter(
    repo: &EntityRepository,
    role: Role,
) -> Result<(DisplayIdCounter, Expect)> {
    if let Some(existing) = repo
        .find::<DisplayIdCounter>(DisplayIdCounter::counter_id(role))
        .await?
    {
        return Ok((existing.value, Expect::Version(existing.version)));
    }

    let users = repo.list_by::<User, _>(|u| u.role == role).await?;
    let highest = users
        .iter()
        .filter_map(|u| parse_display_seq(role, &u.display_id))
        .max()
        .unwrap_or(0);
    let last = highest.max(users.len() as u32);

    Ok((DisplayIdCounter { role, last }, Expect::Absent))
}

/// 身份服务
#[derive(Clone)]
pub struct IdentityService {
    repo: EntityRepository,
    jwt: JwtManager,
    bcrypt_cost: u32,
    min_password_length: usize,
    retry: RetryPolicy,
}

impl IdentityService {
    pub fn new(repo: EntityRepository, auth: &AuthConfig, retry: RetryPolicy) -> Self {
        Self {
            repo,
            jwt: JwtManager::new(JwtConfig::from(auth)),
            bcrypt_cost: auth.bcrypt_cost,
            min_password_length: auth.min_password_length,
            retry,
        }
    }

    /// 注册新用户并建立会话
    #[instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn register(&self, input: RegisterRequest) -> Result<AuthSession> {
        let mut input = input;
        input.email = normalize_email(&input.email);
        input.name = input.name.trim().to_string();
        input.validate()?;
        if input.password.chars().count() < self.min_password_length {
            return Err(PointsError::InvalidRequest(format!(
                "密码长度至少 {} 位",
                self.min_password_length
            )));
        }

        // 哈希计算较慢，放在重试循环之外只做一次
        let password_hash = hash_password(&input.password, self.bcrypt_cost)?;

        let session = retry_with_policy(&self.retry, "register", PointsError::is_retryable, || {
            self.try_register(&input, &password_hash)
        })
        .await?;

        info!(user_id = %session.user.id, display_id = %session.user.display_id, "用户注册成功");
        Ok(session)
    }

    async fn try_register(&self, input: &RegisterRequest, password_hash: &str) -> Result<AuthSession> {
        if self
            .repo
            .find::<EmailIndexEntry>(&input.email)
            .await?
            .is_some()
        {
            return Err(PointsError::EmailAlreadyInUse(input.email.clone()));
        }

        let (mut counter, counter_expect) = load_counter(&self.repo, input.role).await?;
        let display_id = counter.reserve();

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: input.name.clone(),
            display_id,
            role: input.role,
            email: input.email.clone(),
            phone: input.phone.trim().to_string(),
            points: 0,
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        let mut batch = WriteBatch::new();
        batch.insert(&user)?;
        batch.insert(&EmailIndexEntry::new(&user.email, &user.id))?;
        batch.put_with(&counter, counter_expect)?;
        let token = self.stage_session(&mut batch, &user)?;
        self.repo.commit(batch).await?;

        Ok(AuthSession {
            user: user.profile(),
            token,
        })
    }

    /// 邮箱密码登录并建立会话
    ///
    /// 邮箱不存在与密码错误返回同一个错误
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email);
        let Some(index) = self.repo.find::<EmailIndexEntry>(&email).await? else {
            warn!("登录失败：邮箱未注册");
            return Err(PointsError::InvalidCredentials);
        };

        let user = self.repo.get::<User>(&index.value.user_id).await?.into_inner();
        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "登录失败：密码错误");
            return Err(PointsError::InvalidCredentials);
        }

        let mut batch = WriteBatch::new();
        let token = self.stage_session(&mut batch, &user)?;
        self.repo.commit(batch).await?;

        info!(user_id = %user.id, role = %user.role, "登录成功");
        Ok(AuthSession {
            user: user.profile(),
            token,
        })
    }

    fn stage_session(&self, batch: &mut WriteBatch, user: &User) -> Result<String> {
        let issued = self.jwt.issue(&user.id, user.role)?;
        let session = Session {
            id: Session::CURRENT.to_string(),
            user_id: user.id.clone(),
            role: user.role,
            token: issued.token.clone(),
            issued_at: issued.issued_at,
            expires_at: issued.expires_at,
        };
        batch.put_with(&session, Expect::Any)?;
        Ok(issued.token)
    }

    /// 当前会话用户
    ///
    /// 每次重新读取用户记录，保证余额为最新值；令牌失效或用户不存在时返回 None
    pub async fn current_session(&self) -> Result<Option<UserProfile>> {
        let Some(session) = self.repo.find::<Session>(Session::CURRENT).await? else {
            return Ok(None);
        };

        let claims = match self.jwt.verify(&session.value.token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "会话令牌无效，视为未登录");
                return Ok(None);
            }
        };

        Ok(self
            .repo
            .find::<User>(&claims.sub)
            .await?
            .map(|user| user.value.profile()))
    }

    /// 结束当前会话
    #[instrument(skip(self))]
    pub async fn end_session(&self) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.delete(EntityKind::Session, Session::CURRENT, Expect::Any);
        self.repo.commit(batch).await?;
        info!("会话已结束");
        Ok(())
    }

    /// 更新姓名与电话
    ///
    /// 以读取到的版本为条件整体写回，余额和角色保持读取时的值
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<UserProfile> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(PointsError::InvalidRequest("姓名不能为空".to_string()));
        }

        retry_with_policy(&self.retry, "update_profile", PointsError::is_retryable, || {
            self.try_update_profile(user_id, &update)
        })
        .await
    }

    async fn try_update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<UserProfile> {
        let current = self.repo.get::<User>(user_id).await?;
        let mut user = current.value;
        if let Some(name) = &update.name {
            user.name = name.trim().to_string();
        }
        if let Some(phone) = &update.phone {
            user.phone = phone.trim().to_string();
        }

        let mut batch = WriteBatch::new();
        batch.update(&user, current.version)?;
        self.repo.commit(batch).await?;
        Ok(user.profile())
    }

    /// 列出用户，可按角色过滤
    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserProfile>> {
        let users = self
            .repo
            .list_by::<User, _>(|u| role.is_none_or(|r| u.role == r))
            .await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserProfile> {
        Ok(self.repo.get::<User>(user_id).await?.value.profile())
    }
}
