use rolodex_core::{ContactInput, GROUP_PALETTE, GroupInput, GroupSortField};
use rolodex_store::{ContactStore, DataLayout, GroupStore, StoreError};
use tempfile::TempDir;

#[tokio::test]
async fn test_default_colors_follow_palette() {
    let tmp = TempDir::new().unwrap();
    let mut groups = GroupStore::user(&DataLayout::new(tmp.path()), "alice");

    let friends = groups.add(GroupInput::new("Friends")).await.unwrap();
    let family = groups.add(GroupInput::new("Family")).await.unwrap();
    let work = groups
        .add(GroupInput::new("Work").color("#000000"))
        .await
        .unwrap();

    assert_eq!(friends.id, 1);
    assert_eq!(friends.color, GROUP_PALETTE[0]);
    assert_eq!(family.id, 2);
    assert_eq!(family.color, GROUP_PALETTE[1]);
    assert_eq!(work.color, "#000000");
    assert_eq!(friends.is_shared, 0);
}

#[tokio::test]
async fn test_rename_does_not_cascade_to_contacts() {
    let tmp = TempDir::new().unwrap();
    let layout = DataLayout::new(tmp.path());
    let mut groups = GroupStore::user(&layout, "alice");
    let mut contacts = ContactStore::new(&layout, Some("alice"));

    let friends = groups.add(GroupInput::new("Friends")).await.unwrap();
    let ann = contacts
        .add(ContactInput::new("Ann", "111111111").group("Friends"))
        .await
        .unwrap();

    let renamed = groups
        .update(friends.id, GroupInput::new("Buddies"))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Buddies");
    assert_eq!(renamed.color, friends.color);
    assert_eq!(renamed.created_at, friends.created_at);

    contacts.reload().await.unwrap();
    assert_eq!(contacts.get(ann.id).await.unwrap().group, "Friends");
    assert!(contacts.filter_by_group("Buddies").await.unwrap().is_empty());

    groups.delete(friends.id).await.unwrap();
    contacts.reload().await.unwrap();
    assert_eq!(contacts.get(ann.id).await.unwrap().group, "Friends");
}

#[tokio::test]
async fn test_names_are_unique_case_insensitively() {
    let tmp = TempDir::new().unwrap();
    let mut groups = GroupStore::user(&DataLayout::new(tmp.path()), "alice");
    groups.add(GroupInput::new("Friends")).await.unwrap();
    let work = groups.add(GroupInput::new("Work")).await.unwrap();

    let dup = groups.add(GroupInput::new("  friends ")).await;
    assert!(matches!(dup, Err(StoreError::Conflict(_))));

    let clash = groups.update(work.id, GroupInput::new("FRIENDS")).await;
    assert!(matches!(clash, Err(StoreError::Conflict(_))));

    // Changing only the case of its own name is allowed.
    let work = groups.update(work.id, GroupInput::new("WORK")).await.unwrap();
    assert_eq!(work.name, "WORK");
}

#[tokio::test]
async fn test_validation_and_not_found() {
    let tmp = TempDir::new().unwrap();
    let mut groups = GroupStore::user(&DataLayout::new(tmp.path()), "alice");

    let err = groups.add(GroupInput::new("")).await.unwrap_err();
    assert_eq!(err.to_string(), "Field name is required");
    let err = groups.add(GroupInput::new("X")).await.unwrap_err();
    assert_eq!(err.to_string(), "Group name must be at least 2 characters");
    let err = groups.add(GroupInput::new("y".repeat(51))).await.unwrap_err();
    assert_eq!(err.to_string(), "Group name cannot exceed 50 characters");

    assert!(matches!(groups.get(1).await, Err(StoreError::NotFound(_))));
    assert!(matches!(groups.delete(1).await, Err(StoreError::NotFound(_))));
    assert!(matches!(
        groups.update(1, GroupInput::new("Ghosts")).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_lookup_search_and_sort() {
    let tmp = TempDir::new().unwrap();
    let mut groups = GroupStore::user(&DataLayout::new(tmp.path()), "alice");
    groups
        .add(GroupInput::new("work").description("Office people"))
        .await
        .unwrap();
    groups.add(GroupInput::new("Family")).await.unwrap();
    groups
        .add(GroupInput::new("Gym").description("weekend workouts"))
        .await
        .unwrap();

    assert_eq!(groups.get_by_name(" FAMILY ").await.unwrap().id, 2);
    assert!(groups.get_by_name("nobody").await.is_err());

    let hits: Vec<String> = groups.search("WORK").await.into_iter().map(|g| g.name).collect();
    assert_eq!(hits, vec!["work", "Gym"]);
    assert_eq!(groups.search(" ").await.len(), 3);

    let sorted: Vec<String> = groups
        .sort(GroupSortField::Name, false)
        .await
        .into_iter()
        .map(|g| g.name)
        .collect();
    assert_eq!(sorted, vec!["Family", "Gym", "work"]);

    let by_created: Vec<u64> = groups
        .sort(GroupSortField::parse_or_default("created_at"), true)
        .await
        .into_iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(by_created.len(), 3);
    assert_eq!(groups.names().await, vec!["work", "Family", "Gym"]);
}

#[tokio::test]
async fn test_shared_scope_is_a_separate_document() {
    let tmp = TempDir::new().unwrap();
    let layout = DataLayout::new(tmp.path());
    let mut shared = GroupStore::shared(&layout);
    let mut private = GroupStore::user(&layout, "alice");

    shared
        .add(GroupInput::new("Company").shared(true))
        .await
        .unwrap();
    private.add(GroupInput::new("Company")).await.unwrap();

    assert_eq!(shared.count().await, 1);
    assert_eq!(private.count().await, 1);
    assert_eq!(shared.get(1).await.unwrap().is_shared, 1);
    assert!(layout.shared_groups_file().exists());
    assert!(layout.groups_file("alice").exists());
}

#[tokio::test]
async fn test_update_keeps_unspecified_fields_and_statistics() {
    let tmp = TempDir::new().unwrap();
    let mut groups = GroupStore::user(&DataLayout::new(tmp.path()), "alice");
    let g = groups
        .add(GroupInput::new("Club").description("chess").color("#111111"))
        .await
        .unwrap();
    groups.add(GroupInput::new("Team")).await.unwrap();

    let updated = groups.update(g.id, GroupInput::new("Chess Club")).await.unwrap();
    assert_eq!(updated.description, "chess");
    assert_eq!(updated.color, "#111111");

    let stats = groups.statistics().await;
    assert_eq!(stats.total_groups, 2);
    assert_eq!(stats.has_description, 1);
    assert_eq!(stats.colors_used, 2);
    assert_eq!(stats.group_names, vec!["Chess Club", "Team"]);

    assert_eq!(groups.delete_all().await.unwrap(), 2);
    assert!(groups.get_all().await.is_empty());
}

#[tokio::test]
async fn test_boolean_shared_flag_reads_and_survives_writes() {
    let tmp = TempDir::new().unwrap();
    let layout = DataLayout::new(tmp.path());
    let path = layout.shared_groups_file();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        r#"[{"id": 1, "name": "Company", "is_shared": true, "created_at": ""}]"#,
    )
    .unwrap();

    let mut shared = GroupStore::shared(&layout);
    assert_eq!(shared.get(1).await.unwrap().is_shared, 1);

    shared.add(GroupInput::new("Board")).await.unwrap();
    shared.reload().await;
    assert_eq!(shared.names().await, vec!["Company", "Board"]);
}
