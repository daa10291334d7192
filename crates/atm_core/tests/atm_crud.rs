use atm_core::access::permission::{PERMISSION_ADMINISTER, PERMISSION_VIEW};
use atm_core::db::open_db_in_memory;
use atm_core::{
    Account, Atm, AtmListQuery, AtmRepository, AtmService, AtmType, AtmTypeRepository, Ownable,
    RepoError, SaveStatus, ServiceError, SqliteAtmRepository, SqliteAtmTypeRepository,
    TimestampTracked, WeekDay,
};
use rusqlite::Connection;

fn seeded_connection() -> Connection {
    let conn = open_db_in_memory().unwrap();
    let types = SqliteAtmTypeRepository::try_new(&conn).unwrap();
    types
        .create_atm_type(&AtmType::new("standard", "Standard"))
        .unwrap();
    types
        .create_atm_type(&AtmType::new("deposit", "Deposit"))
        .unwrap();
    conn
}

fn sample_atm(bundle: &str, address: &str) -> Atm {
    let mut atm = Atm::new(bundle);
    atm.set_device_type(Some("withdraw".to_string()));
    atm.set_city(Some("Prague".to_string()));
    atm.set_address(Some(address.to_string()));
    atm.set_brand(Some("KB".to_string()));
    atm.set_latitude(Some("50.0755381".to_string()));
    atm.set_longitude(Some("14.4378005".to_string()));
    atm.set_fee(Some(true));
    atm.set_open_hours(
        WeekDay::Monday,
        Some("00:00".to_string()),
        Some("24:00".to_string()),
    );
    atm
}

#[test]
fn save_and_get_roundtrip() {
    let conn = seeded_connection();
    let repo = SqliteAtmRepository::try_new(&conn).unwrap();

    let mut atm = sample_atm("standard", "Wenceslas Square 1");
    assert_eq!(repo.save(&mut atm).unwrap(), SaveStatus::SavedNew);
    let id = atm.id().expect("id assigned on insert");

    let loaded = repo.get_atm(id).unwrap().unwrap();
    assert_eq!(loaded, atm);
    assert_eq!(loaded.owner_id(), Some(0));
    assert!(loaded.is_fee());
    assert!(loaded.open_hours_for(WeekDay::Monday).is_available_24h());
    assert_eq!(loaded.district(), "");
}

#[test]
fn saving_again_updates_and_keeps_created_time() {
    let conn = seeded_connection();
    let repo = SqliteAtmRepository::try_new(&conn).unwrap();

    let mut atm = sample_atm("standard", "Old Town 5");
    repo.save(&mut atm).unwrap();
    let created = atm.created_time();

    atm.set_brand(Some("CSOB".to_string()));
    atm.set_fee(None);
    assert_eq!(repo.save(&mut atm).unwrap(), SaveStatus::SavedUpdated);

    let loaded = repo.get_atm(atm.id().unwrap()).unwrap().unwrap();
    assert_eq!(loaded.brand(), "CSOB");
    assert_eq!(loaded.fee_setting(), None);
    assert_eq!(loaded.created_time(), created);
}

#[test]
fn invalid_records_are_not_persisted() {
    let conn = seeded_connection();
    let repo = SqliteAtmRepository::try_new(&conn).unwrap();

    let mut atm = sample_atm("standard", "Somewhere 1");
    atm.set_latitude(Some("50.07553812".to_string()));
    let err = repo.save(&mut atm).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(atm.is_new());
    assert!(repo.list_atms(&AtmListQuery::default()).unwrap().is_empty());
}

#[test]
fn unknown_bundle_is_rejected_by_storage() {
    let conn = seeded_connection();
    let repo = SqliteAtmRepository::try_new(&conn).unwrap();

    let mut atm = sample_atm("nonexistent", "Nowhere 1");
    assert!(matches!(repo.save(&mut atm).unwrap_err(), RepoError::Db(_)));
}

#[test]
fn list_filters_by_bundle_and_paginates() {
    let conn = seeded_connection();
    let repo = SqliteAtmRepository::try_new(&conn).unwrap();

    for (bundle, address) in [
        ("standard", "A 1"),
        ("deposit", "B 2"),
        ("standard", "C 3"),
        ("standard", "D 4"),
    ] {
        repo.save(&mut sample_atm(bundle, address)).unwrap();
    }

    let standard = repo
        .list_atms(&AtmListQuery {
            bundle: Some("standard".to_string()),
            ..AtmListQuery::default()
        })
        .unwrap();
    assert_eq!(standard.len(), 3);
    assert!(standard.iter().all(|atm| atm.bundle() == "standard"));

    let page = repo
        .list_atms(&AtmListQuery {
            bundle: None,
            limit: Some(2),
            offset: 1,
        })
        .unwrap();
    assert_eq!(page.len(), 2);

    let tail = repo
        .list_atms(&AtmListQuery {
            offset: 3,
            ..AtmListQuery::default()
        })
        .unwrap();
    assert_eq!(tail.len(), 1);
}

#[test]
fn list_orders_by_changed_desc_then_id() {
    let conn = seeded_connection();
    let repo = SqliteAtmRepository::try_new(&conn).unwrap();

    let mut ids = Vec::new();
    for address in ["A 1", "B 2", "C 3"] {
        let mut atm = sample_atm("standard", address);
        repo.save(&mut atm).unwrap();
        ids.push(atm.id().unwrap());
    }
    conn.execute("UPDATE atms SET changed = 100;", []).unwrap();
    conn.execute("UPDATE atms SET changed = 200 WHERE id = ?1;", [ids[2]])
        .unwrap();

    let listed: Vec<_> = repo
        .list_atms(&AtmListQuery::default())
        .unwrap()
        .iter()
        .filter_map(Atm::id)
        .collect();
    assert_eq!(listed, vec![ids[2], ids[0], ids[1]]);
}

#[test]
fn delete_removes_record_and_reports_missing() {
    let conn = seeded_connection();
    let repo = SqliteAtmRepository::try_new(&conn).unwrap();

    let mut atm = sample_atm("standard", "Gone 1");
    repo.save(&mut atm).unwrap();
    let id = atm.id().unwrap();

    repo.delete_atm(id).unwrap();
    assert!(repo.get_atm(id).unwrap().is_none());
    assert!(matches!(
        repo.delete_atm(id).unwrap_err(),
        RepoError::NotFound(_)
    ));
}

#[test]
fn repositories_require_migrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteAtmRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        })
    ));
    assert!(SqliteAtmTypeRepository::try_new(&conn).is_err());
}

#[test]
fn atm_types_are_listed_by_label_and_protected_while_referenced() {
    let conn = seeded_connection();
    let types = SqliteAtmTypeRepository::try_new(&conn).unwrap();

    let labels: Vec<_> = types
        .list_atm_types()
        .unwrap()
        .into_iter()
        .map(|atm_type| atm_type.label)
        .collect();
    assert_eq!(labels, vec!["Deposit".to_string(), "Standard".to_string()]);

    let repo = SqliteAtmRepository::try_new(&conn).unwrap();
    repo.save(&mut sample_atm("deposit", "Bank 1")).unwrap();
    assert!(types.delete_atm_type("deposit").is_err());
    types.delete_atm_type("standard").unwrap();
    assert!(types.get_atm_type("standard").unwrap().is_none());
    assert!(matches!(
        types.create_atm_type(&AtmType::new("Bad Id", "Bad")),
        Err(RepoError::TypeValidation(_))
    ));
}

#[test]
fn service_assigns_creator_as_owner() {
    let conn = seeded_connection();
    let service = AtmService::new(SqliteAtmRepository::try_new(&conn).unwrap());
    let admin = Account::new(7, [PERMISSION_ADMINISTER]);

    let mut atm = sample_atm("standard", "Owner 1");
    assert_eq!(
        service.create_atm(&admin, &mut atm).unwrap(),
        SaveStatus::SavedNew
    );
    let loaded = service.get_atm(&admin, atm.id().unwrap()).unwrap().unwrap();
    assert_eq!(loaded.owner_id(), Some(7));
}

#[test]
fn service_denies_operations_without_permission() {
    let conn = seeded_connection();
    let service = AtmService::new(SqliteAtmRepository::try_new(&conn).unwrap());
    let admin = Account::new(1, [PERMISSION_ADMINISTER]);
    let viewer = Account::new(2, [PERMISSION_VIEW]);

    let mut atm = sample_atm("standard", "Guarded 1");
    assert!(matches!(
        service.create_atm(&viewer, &mut atm),
        Err(ServiceError::AccessDenied {
            operation: "create"
        })
    ));
    service.create_atm(&admin, &mut atm).unwrap();
    let id = atm.id().unwrap();

    assert!(service.get_atm(&viewer, id).unwrap().is_some());
    assert_eq!(
        service
            .list_atms(&viewer, &AtmListQuery::default())
            .unwrap()
            .len(),
        1
    );
    assert!(service
        .list_atms(&Account::anonymous(), &AtmListQuery::default())
        .unwrap()
        .is_empty());
    assert!(matches!(
        service.update_atm(&viewer, &mut atm),
        Err(ServiceError::AccessDenied { .. })
    ));
    assert!(matches!(
        service.delete_atm(&viewer, id),
        Err(ServiceError::AccessDenied { .. })
    ));
    service.delete_atm(&admin, id).unwrap();
    assert!(matches!(
        service.delete_atm(&admin, id),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn saving_a_record_that_vanished_fails() {
    let conn = seeded_connection();
    let service = AtmService::new(SqliteAtmRepository::try_new(&conn).unwrap());

    let mut atm = sample_atm("standard", "Vanishing 1");
    service.save_atm(&mut atm).unwrap();
    conn.execute("DELETE FROM atms;", []).unwrap();

    assert!(matches!(
        service.save_atm(&mut atm),
        Err(ServiceError::SaveFailed(_))
    ));
}

#[test]
fn update_requires_saved_record() {
    let conn = seeded_connection();
    let service = AtmService::new(SqliteAtmRepository::try_new(&conn).unwrap());
    let admin = Account::new(1, [PERMISSION_ADMINISTER]);

    let mut atm = sample_atm("standard", "New 1");
    assert!(matches!(
        service.update_atm(&admin, &mut atm),
        Err(ServiceError::NotPersisted)
    ));
}

#[test]
fn failed_save_leaves_the_record_untouched() {
    let conn = seeded_connection();
    let repo = SqliteAtmRepository::try_new(&conn).unwrap();

    let mut atm = sample_atm("standard", "Retry 1");
    atm.set_longitude(Some("14.43780051".to_string()));
    let before = atm.clone();
    assert!(repo.save(&mut atm).is_err());
    assert_eq!(atm, before);
    assert_eq!(atm.owner_id(), None);
    assert_eq!(atm.created_time(), None);
    assert_eq!(atm.changed_time(), None);

    atm.set_longitude(Some("14.4378005".to_string()));
    repo.save(&mut atm).unwrap();
    let stored = repo.get_atm(atm.id().unwrap()).unwrap().unwrap();
    assert_eq!(stored.created_time(), atm.created_time());
    assert_eq!(stored.owner_id(), Some(0));
}

#[test]
fn failed_update_keeps_previous_change_time() {
    let conn = seeded_connection();
    let repo = SqliteAtmRepository::try_new(&conn).unwrap();

    let mut atm = sample_atm("standard", "Vanish 2");
    repo.save(&mut atm).unwrap();
    let changed = atm.changed_time();
    conn.execute("DELETE FROM atms;", []).unwrap();

    assert!(matches!(
        repo.save(&mut atm).unwrap_err(),
        RepoError::NotFound(_)
    ));
    assert_eq!(atm.changed_time(), changed);
}
