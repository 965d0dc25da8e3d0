use std::collections::HashMap;

pub(crate) const SERVICE_NAME: &str = "herdbook";

/// Attribute under which the bearer token is filed.
pub const TOKEN_KEY: &str = "auth_token";

fn attributes(server: &str) -> HashMap<&str, &str> {
    let mut attrs = HashMap::new();
    attrs.insert("service", SERVICE_NAME);
    attrs.insert("server", server);
    attrs.insert("key", TOKEN_KEY);
    attrs
}

/// Store the API bearer token for `server` in the system keyring.
pub async fn store_token(server: &str, token: &str) -> Result<(), String> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| format!("Failed to connect to keyring: {}", e))?;

    keyring
        .create_item(
            &format!("Herdbook API token ({})", server),
            &attributes(server),
            token.as_bytes(),
            true, // replace existing
        )
        .await
        .map_err(|e| format!("Failed to store token: {}", e))?;

    Ok(())
}

/// Load the bearer token for `server`, if one was stored.
pub async fn load_token(server: &str) -> Result<Option<String>, String> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| format!("Failed to connect to keyring: {}", e))?;

    let items = keyring
        .search_items(&attributes(server))
        .await
        .map_err(|e| format!("Failed to search keyring: {}", e))?;

    if let Some(item) = items.first() {
        let secret_bytes = item
            .secret()
            .await
            .map_err(|e| format!("Failed to read secret: {}", e))?;
        let token = String::from_utf8(secret_bytes.to_vec())
            .map_err(|e| format!("Invalid UTF-8 in secret: {}", e))?;
        if !token.is_empty() {
            return Ok(Some(token));
        }
    }

    Ok(None)
}

/// Remove every stored token for `server`.
pub async fn delete_token(server: &str) -> Result<(), String> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| format!("Failed to connect to keyring: {}", e))?;

    let items = keyring
        .search_items(&attributes(server))
        .await
        .map_err(|e| format!("Failed to search keyring: {}", e))?;

    for item in items {
        item.delete()
            .await
            .map_err(|e| format!("Failed to delete token: {}", e))?;
    }

    Ok(())
}
