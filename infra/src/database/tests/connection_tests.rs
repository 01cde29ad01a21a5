use crate::database::PoolStatistics;

#[test]
fn test_utilization_counts_only_checked_out_connections() {
    let stats = PoolStatistics {
        connections: 6,
        idle_connections: 2,
        max_connections: 8,
    };
    assert!((stats.utilization() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_utilization_of_empty_pool_is_zero() {
    let stats = PoolStatistics {
        connections: 0,
        idle_connections: 0,
        max_connections: 0,
    };
    assert_eq!(stats.utilization(), 0.0);
}

#[tokio::test]
async fn test_invalid_url_is_a_config_error() {
    let config = ds_shared::config::DatabaseConfig::new("not-a-database-url");
    let result = crate::database::DatabasePool::new(config).await;
    assert!(matches!(result, Err(crate::InfrastructureError::Config(_))));
}
