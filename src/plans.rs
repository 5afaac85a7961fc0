use seedkit_kernel::{SeedPlan, SeedRequest, Variant};

/// Placeholder password shared by every blog user. Not for production.
pub const BLOG_PASSWORD: &str = "changeit";

/// Primary database and its application user
pub fn primary() -> SeedRequest {
    SeedRequest::new("blog-db", "blog-db-user", BLOG_PASSWORD)
}

/// Database used by the blog service test suite
pub fn test() -> SeedRequest {
    SeedRequest::new("blog-test-db", "blog-test-db-user", BLOG_PASSWORD)
}

/// Both blog databases, primary first.
pub fn blog_plan(variant: Variant) -> SeedPlan {
    tracing::debug!(variant = ?variant, "building blog seed plan");
    SeedPlan::new(variant).request(primary()).request(test())
}
