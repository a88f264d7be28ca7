// src/config.rs

use std::{env, net::SocketAddr, ops::RangeInclusive, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::random::{OsRandom, RandomSource},
    db::{
        MemoryStore, PrincipalRepository, PrincipalStore, ProductRepository, ProductStore,
        SaleRepository, SaleStore, TokenRepository, TokenStore,
    },
    services::{AuthService, AuthSettings, CatalogService, CustomerService, RbacService, SaleService},
};

/// Credenciais do primeiro administrador, criado na inicialização se faltar.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub request_timeout: Duration,
    /// `None` = tokens sem expiração (`TOKEN_TTL_SECS=0`).
    pub token_ttl: Option<Duration>,
    pub bcrypt_cost: u32,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 9999)),
            db_max_connections: 5,
            db_acquire_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_millis(5_000),
            token_ttl: Some(Duration::from_secs(7 * 24 * 60 * 60)),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            bootstrap_admin: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Lê a configuração de qualquer fonte chave → valor (o ambiente, ou um mapa nos testes).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        let token_ttl_secs: u64 = parse_or(&lookup, "TOKEN_TTL_SECS", 7 * 24 * 60 * 60)?;
        let token_ttl = (token_ttl_secs > 0).then(|| Duration::from_secs(token_ttl_secs));

        let bootstrap_admin = match (lookup("BOOTSTRAP_ADMIN_PHONE"), lookup("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(phone), Some(password)) => Some(BootstrapAdmin { phone, password }),
            (None, None) => None,
            _ => anyhow::bail!(
                "BOOTSTRAP_ADMIN_PHONE e BOOTSTRAP_ADMIN_PASSWORD devem ser definidas juntas"
            ),
        };

        Ok(Self {
            database_url,
            bind_addr: parse_or(&lookup, "BIND_ADDR", defaults.bind_addr)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_acquire_timeout: Duration::from_secs(parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            request_timeout: Duration::from_millis(parse_in_range(
                &lookup,
                "REQUEST_TIMEOUT_MS",
                5_000,
                REQUEST_TIMEOUT_MS_RANGE,
            )?),
            token_ttl,
            bcrypt_cost: parse_in_range(&lookup, "BCRYPT_COST", defaults.bcrypt_cost, BCRYPT_COST_RANGE)?,
            bootstrap_admin,
        })
    }

    fn auth_settings(&self) -> anyhow::Result<AuthSettings> {
        let token_ttl = self
            .token_ttl
            .map(chrono::Duration::from_std)
            .transpose()
            .context("TOKEN_TTL_SECS fora do intervalo suportado")?;
        Ok(AuthSettings { token_ttl, bcrypt_cost: self.bcrypt_cost })
    }
}

/// Limites aceitos (de 1 ms a 10 minutos por requisição; custos suportados pelo bcrypt).
const REQUEST_TIMEOUT_MS_RANGE: RangeInclusive<u64> = 1..=600_000;
const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;

fn parse_in_range<F, T>(lookup: &F, key: &str, default: T, range: RangeInclusive<T>) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    let value = parse_or(lookup, key, default)?;
    if !range.contains(&value) {
        anyhow::bail!(
            "Valor fora do intervalo para {}: {} (aceito {}..={})",
            key,
            value,
            range.start(),
            range.end()
        );
    }
    Ok(value)
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Valor inválido para {}: {}", key, e)),
        None => Ok(default),
    }
}

pub async fn connect_pool(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect(&config.database_url)
        .await?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(pool)
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub rbac_service: RbacService,
    pub customer_service: CustomerService,
    pub catalog_service: CatalogService,
    pub sale_service: SaleService,
}

impl AppState {
    /// Monta o gráfico de dependências sobre o Postgres.
    pub fn with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        Self::from_stores(
            config,
            Arc::new(PrincipalRepository::new(pool.clone())),
            Arc::new(TokenRepository::new(pool.clone())),
            Arc::new(ProductRepository::new(pool.clone())),
            Arc::new(SaleRepository::new(pool)),
            Arc::new(OsRandom),
        )
    }

    /// Mesmo gráfico, mas tudo em memória.
    pub fn in_memory(config: Config, store: MemoryStore) -> anyhow::Result<Self> {
        let shared = Arc::new(store);
        Self::from_stores(
            config,
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared,
            Arc::new(OsRandom),
        )
    }

    pub fn from_stores(
        config: Config,
        principals: Arc<dyn PrincipalStore>,
        tokens: Arc<dyn TokenStore>,
        products: Arc<dyn ProductStore>,
        sales: Arc<dyn SaleStore>,
        random: Arc<dyn RandomSource>,
    ) -> anyhow::Result<Self> {
        let auth_service = AuthService::new(
            principals.clone(),
            tokens.clone(),
            random,
            config.auth_settings()?,
        );
        let rbac_service = RbacService::new(principals.clone());
        let customer_service = CustomerService::new(principals.clone(), tokens);
        let catalog_service = CatalogService::new(products);
        let sale_service = SaleService::new(sales, principals);

        Ok(Self {
            config: Arc::new(config),
            auth_service,
            rbac_service,
            customer_service,
            catalog_service,
            sale_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/retail")])).unwrap();

        assert_eq!(config.bind_addr.port(), 9999);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.request_timeout, Duration::from_millis(5_000));
        assert_eq!(config.token_ttl, Some(Duration::from_secs(604_800)));
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn database_url_is_required() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn zero_ttl_disables_expiry_and_bad_numbers_fail() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("TOKEN_TTL_SECS", "0"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ]))
        .unwrap();
        assert_eq!(config.token_ttl, None);
        assert_eq!(config.bind_addr.port(), 8080);

        let bad = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x"), ("DB_MAX_CONNECTIONS", "muitas")]));
        assert!(bad.is_err());
    }

    #[test]
    fn timeout_and_bcrypt_cost_are_bounded() {
        let huge_timeout = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("REQUEST_TIMEOUT_MS", "18446744073709551615"),
        ]));
        assert!(huge_timeout.is_err());

        let zero_timeout = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x"), ("REQUEST_TIMEOUT_MS", "0")]));
        assert!(zero_timeout.is_err());

        for cost in ["3", "32"] {
            let bad = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x"), ("BCRYPT_COST", cost)]));
            assert!(bad.is_err(), "BCRYPT_COST={} deveria falhar", cost);
        }

        let ok = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("REQUEST_TIMEOUT_MS", "600000"),
            ("BCRYPT_COST", "4"),
        ]))
        .unwrap();
        assert_eq!(ok.request_timeout, Duration::from_secs(600));
        assert_eq!(ok.bcrypt_cost, 4);
    }

    #[test]
    fn bootstrap_admin_needs_both_variables() {
        let half = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x"), ("BOOTSTRAP_ADMIN_PHONE", "+1")]));
        assert!(half.is_err());

        let full = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("BOOTSTRAP_ADMIN_PHONE", "+1"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "admin-pass"),
        ]))
        .unwrap();
        assert_eq!(full.bootstrap_admin.unwrap().phone, "+1");
    }
}
