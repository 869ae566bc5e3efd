use crate::{app::AppContext, boot, environment::Environment};

use super::config::test_config;

pub async fn get_app_context() -> AppContext {
    boot::create_context(&Environment::Test, test_config()).expect("test context")
}
