//! IAM integration tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```
//! AWS_PROFILE=your_profile cargo test --test aws_iam_integration -- --ignored
//! ```

use songplay_dwh::aws::{IamClient, IamOperations};
use songplay_dwh::provision::{delete_role, ensure_role};
use songplay_test_utils::{get_test_region, test_role_name, test_settings};

/// Role lifecycle against real IAM:
/// 1. Fresh role is created with the S3 policy attached
/// 2. A second ensure reuses it without failing
/// 3. Delete detaches the policy and removes the role
#[tokio::test]
#[ignore]
async fn test_ensure_and_delete_role() {
    let region = get_test_region();
    let client = IamClient::new(&region).await;

    let mut settings = test_settings();
    settings.aws.region = region;
    settings.iam.role_name = test_role_name();
    settings.iam.role_arn = None;

    let role = ensure_role(&client, &settings)
        .await
        .expect("Should create role - AWS credentials required");
    assert!(role.created);
    assert!(role.arn.ends_with(&format!("role/{}", settings.iam.role_name)));

    let policies = client
        .list_attached_role_policies(&settings.iam.role_name)
        .await
        .expect("Should list policies");
    assert_eq!(policies, vec![settings.iam.policy_arn.clone()]);

    let again = ensure_role(&client, &settings)
        .await
        .expect("Existing role should be reused");
    assert!(!again.created);
    assert_eq!(again.arn, role.arn);

    delete_role(&client, &settings)
        .await
        .expect("Should delete role");

    let err = client
        .get_role_arn(&settings.iam.role_name)
        .await
        .expect_err("Role should be gone");
    assert!(err.is_not_found(), "Expected NotFound, got: {err}");
}

/// Deleting a role that does not exist reports not-found
#[tokio::test]
#[ignore]
async fn test_delete_missing_role_fails() {
    let client = IamClient::new(&get_test_region()).await;

    let err = client
        .delete_role(&test_role_name())
        .await
        .expect_err("Missing role cannot be deleted");
    assert!(err.is_not_found(), "Expected NotFound, got: {err}");
}
