use rolodex_core::{AdminLevel, Permission, ProfileUpdate, Registration, Role};
use rolodex_store::credentials::hash_secret;
use rolodex_store::{AccountStore, DataLayout, StoreError};
use tempfile::TempDir;

#[tokio::test]
async fn test_alice_registration_and_login_scenario() {
    let tmp = TempDir::new().unwrap();
    let layout = DataLayout::new(tmp.path());
    let users = AccountStore::users(&layout);

    let alice = users
        .register(Registration::new("alice", "password1"))
        .await
        .unwrap();
    assert_eq!(alice.id, 1);
    assert_eq!(alice.role, Role::User);
    assert_eq!(alice.password, hash_secret("password1"));
    assert_eq!(alice.contacts_file, "alice_contacts.json");

    let again = users.register(Registration::new("alice", "password1")).await;
    let err = again.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert_eq!(err.to_string(), "Username already exists");

    let wrong = users.login("alice", "wrong").await;
    assert!(matches!(wrong, Err(StoreError::Unauthorized(_))));

    let logged_in = users.login("alice", "password1").await.unwrap();
    assert_eq!(logged_in.username, "alice");
    assert!(logged_in.last_login.is_some());

    assert!(matches!(
        users.login("nobody", "password1").await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        users.login("", "").await,
        Err(StoreError::Validation(_))
    ));
}

#[tokio::test]
async fn test_registration_provisions_contacts_file_and_hides_secrets() {
    let tmp = TempDir::new().unwrap();
    let layout = DataLayout::new(tmp.path());
    let users = AccountStore::users(&layout);

    users
        .register(Registration::new("bob", "hunter22").security("First car?", "Civic"))
        .await
        .unwrap();

    let contacts = std::fs::read_to_string(layout.contacts_file("bob")).unwrap();
    assert_eq!(contacts.trim(), "[]");

    let raw = std::fs::read_to_string(layout.users_file()).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &doc["users"][0];
    assert_eq!(record["username"], "bob");
    assert!(record.get("password_plain").is_none());
    assert!(record.get("security_answer").is_none());
    assert!(!raw.contains("hunter22"));
    assert!(!raw.contains("Civic"));

    assert_eq!(
        users.contacts_file("bob").await.unwrap(),
        layout.contacts_file("bob")
    );
}

#[tokio::test]
async fn test_registration_validation() {
    let tmp = TempDir::new().unwrap();
    let users = AccountStore::users(&DataLayout::new(tmp.path()));

    let err = users.register(Registration::new("al", "password1")).await.unwrap_err();
    assert_eq!(err.to_string(), "Username must be at least 3 characters");
    let err = users.register(Registration::new("alice", "12345")).await.unwrap_err();
    assert_eq!(err.to_string(), "Password must be at least 6 characters");
    assert!(users.list().await.is_empty());
}

#[tokio::test]
async fn test_security_question_recovery() {
    let tmp = TempDir::new().unwrap();
    let users = AccountStore::users(&DataLayout::new(tmp.path()));
    users
        .register(Registration::new("carol", "oldpass1").security("Pet?", " Rex "))
        .await
        .unwrap();
    users
        .register(Registration::new("dave", "oldpass1"))
        .await
        .unwrap();

    assert_eq!(users.security_question("carol").await.unwrap(), "Pet?");
    assert_eq!(
        users.security_question("dave").await.unwrap(),
        "What is your pet's name?"
    );

    users.verify_security_answer("carol", "rEx").await.unwrap();
    assert!(matches!(
        users.verify_security_answer("carol", "max").await,
        Err(StoreError::Unauthorized(_))
    ));
    assert!(matches!(
        users.verify_security_answer("nobody", "rex").await,
        Err(StoreError::NotFound(_))
    ));

    assert!(matches!(
        users.reset_password("carol", "rex", "short").await,
        Err(StoreError::Validation(_))
    ));
    assert!(matches!(
        users.reset_password("carol", "max", "newpass1").await,
        Err(StoreError::Unauthorized(_))
    ));

    users.reset_password("carol", "REX ", "newpass1").await.unwrap();
    assert!(users.login("carol", "oldpass1").await.is_err());
    let carol = users.login("carol", "newpass1").await.unwrap();
    assert!(carol.password_reset_at.is_some());
}

#[tokio::test]
async fn test_profile_updates_only_allowed_fields() {
    let tmp = TempDir::new().unwrap();
    let users = AccountStore::users(&DataLayout::new(tmp.path()));
    let before = users
        .register(Registration::new("erin", "password1"))
        .await
        .unwrap();

    let profile = users
        .update_profile(
            "erin",
            ProfileUpdate {
                fullname: Some(" Erin Example ".to_string()),
                phone: Some("555 0100".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.fullname, "Erin Example");
    assert_eq!(profile.phone, "555 0100");
    assert_eq!(profile.email, "");
    assert_eq!(profile.username, "erin");

    let after = users.get("erin").await.unwrap();
    assert_eq!(after.password, before.password);
    assert_eq!(users.profile("erin").await.unwrap(), profile);

    assert!(matches!(
        users.profile("").await,
        Err(StoreError::NotAuthenticated)
    ));
    assert!(matches!(
        users.update_profile("ghost", ProfileUpdate::default()).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_admin_accounts_carry_grant() {
    let tmp = TempDir::new().unwrap();
    let layout = DataLayout::new(tmp.path());
    let admins = AccountStore::admins(&layout);

    let root = admins
        .register_with_level(Registration::new("root", "rootpass"), AdminLevel::Superadmin)
        .await
        .unwrap();
    assert_eq!(root.role, Role::Admin);
    let grant = root.admin.clone().unwrap();
    assert_eq!(grant.level, AdminLevel::Superadmin);
    assert!(root.allows(Permission::ViewUsers));
    assert!(layout.admin_contacts_file("root").exists());

    let dup = admins.register(Registration::new("root", "rootpass")).await;
    assert_eq!(dup.unwrap_err().to_string(), "Admin username already exists");

    let logged_in = admins.login("root", "rootpass").await.unwrap();
    assert!(logged_in.is_admin());
    assert!(admins.get("root").await.unwrap().last_login.is_some());
}

#[tokio::test]
async fn test_legacy_admin_document_keeps_level_and_permissions() {
    let tmp = TempDir::new().unwrap();
    let layout = DataLayout::new(tmp.path());
    std::fs::create_dir_all(layout.admins_file().parent().unwrap()).unwrap();
    std::fs::write(
        layout.admins_file(),
        format!(
            r#"{{"admins": [
                {{"username": "boss", "password": "{}", "password_plain": "bosspass", "full_name": "Big Boss", "role": "superadmin", "created_at": "2024-01-02T03:04:05.678901", "last_login": null, "permissions": ["view_users"]}},
                {{"username": "helper", "password": "{}", "role": "admin", "created_at": "2024-01-02T03:04:05.678901"}}
            ]}}"#,
            hash_secret("bosspass"),
            hash_secret("helppass")
        ),
    )
    .unwrap();

    let admins = AccountStore::admins(&layout);
    let boss = admins.login("boss", "bosspass").await.unwrap();
    assert_eq!(boss.role, Role::Admin);
    assert_eq!(boss.fullname, "Big Boss");
    let grant = boss.admin.clone().unwrap();
    assert_eq!(grant.level, AdminLevel::Superadmin);
    assert_eq!(grant.permissions, vec![Permission::ViewUsers]);
    assert!(!boss.allows(Permission::ViewStatistics));

    // Only records without any grant data fall back to the defaults.
    let helper = admins.get("helper").await.unwrap();
    assert!(helper.allows(Permission::ViewStatistics));

    // The rewrite on login keeps the grant and scrubs the plaintext copy.
    let raw = std::fs::read_to_string(layout.admins_file()).unwrap();
    assert!(!raw.contains("password_plain"));
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["admins"][0]["admin"]["level"], "superadmin");
    assert_eq!(doc["admins"][0]["admin"]["permissions"], serde_json::json!(["view_users"]));
    assert_eq!(doc["admins"][0]["fullname"], "Big Boss");

    let reread = AccountStore::admins(&layout).get("boss").await.unwrap();
    assert_eq!(reread.admin, boss.admin);
}

#[tokio::test]
async fn test_delete_and_admin_password_change() {
    let tmp = TempDir::new().unwrap();
    let layout = DataLayout::new(tmp.path());
    let users = AccountStore::users(&layout);
    users.register(Registration::new("frank", "password1")).await.unwrap();
    users.register(Registration::new("admin", "password1")).await.unwrap();
    std::fs::write(layout.groups_file("frank"), "[]").unwrap();

    users.set_password("frank", "changed1").await.unwrap();
    users.login("frank", "changed1").await.unwrap();
    assert!(matches!(
        users.set_password("ghost", "changed1").await,
        Err(StoreError::NotFound(_))
    ));

    assert!(matches!(
        users.delete("admin").await,
        Err(StoreError::Validation(_))
    ));
    let removed = users.delete("frank").await.unwrap();
    assert_eq!(removed.username, "frank");
    assert!(!layout.contacts_file("frank").exists());
    assert!(!layout.groups_file("frank").exists());
    assert!(!users.exists("frank").await);
    assert!(matches!(
        users.delete("frank").await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_search_by_username() {
    let tmp = TempDir::new().unwrap();
    let users = AccountStore::users(&DataLayout::new(tmp.path()));
    for name in ["alice", "Alina", "bob"] {
        users.register(Registration::new(name, "password1")).await.unwrap();
    }

    let hits: Vec<String> = users.search("ALI").await.into_iter().map(|a| a.username).collect();
    assert_eq!(hits, vec!["alice", "Alina"]);
    assert_eq!(users.search("").await.len(), 3);
}
