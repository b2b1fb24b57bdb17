use anyhow::Result;

pub async fn status() -> Result<()> {
    let pool = mbo_db::connect_from_env().await?;
    let s = mbo_db::status(&pool).await?;
    println!("db_ok={} has_sessions_table={}", s.ok, s.has_sessions_table);
    Ok(())
}

pub async fn migrate() -> Result<()> {
    let pool = mbo_db::connect_from_env().await?;
    mbo_db::migrate(&pool).await?;
    println!("migrations_applied=true");
    Ok(())
}
