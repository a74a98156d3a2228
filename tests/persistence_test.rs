use actor_store::{
    Concept, ConceptRepository, Locale, StoreConfig, StoreError, WikiEntity, WikiEntityRepository, WikiSearchName,
    WikiSearchNameRepository, WikiTitle, WikiTitleRepository,
};
use std::fs;

fn config(dir: &std::path::Path) -> StoreConfig {
    StoreConfig::new(dir, Locale::new("ro", "md").unwrap())
}

/// Create N records, close, reopen: every field of every record survives.
#[test]
fn test_concepts_round_trip_through_close() {
    let test_dir = tempfile::tempdir().unwrap();
    let config = config(test_dir.path());
    let locale = config.locale.clone();

    let names = ["Chisinau", "Balti", "Moldova", "Maia Sandu", "PSRM", "Igor Dodon"];
    let mut created = Vec::new();
    {
        let mut repo = ConceptRepository::open(&config).unwrap();
        for name in names {
            let mut concept = Concept::new(&locale, name, None);
            if name == "PSRM" {
                concept = concept.abbreviation().with_context_names(vec!["Partidul Socialistilor".to_string()]);
            }
            created.push(repo.create(concept).unwrap());
        }
        repo.increment_popularity(&created[0].id).unwrap();
        created[0].popularity += 1;
        repo.close().unwrap();
    }

    assert!(config.concepts_file().is_file());

    let repo = ConceptRepository::open(&config).unwrap();
    assert_eq!(repo.count(), names.len());
    for (before, reloaded) in created.iter().zip(repo.all()) {
        assert_eq!(before, reloaded);
    }
    assert_eq!(repo.get_by_name_hash(&created[3].name_hash).len(), 1);
}

#[test]
fn test_every_mutation_is_persisted_without_close() {
    let test_dir = tempfile::tempdir().unwrap();
    let config = config(test_dir.path());
    let locale = config.locale.clone();

    let mut repo = ConceptRepository::open(&config).unwrap();
    let kept = repo.create(Concept::new(&locale, "Cahul", None)).unwrap();
    let dropped = repo.create(Concept::new(&locale, "Ungheni", None)).unwrap();
    repo.delete(&dropped.id).unwrap();

    // a second handle sees exactly what the first one has written so far
    let observer = ConceptRepository::open(&config).unwrap();
    assert_eq!(observer.count(), 1);
    assert!(observer.exists(&kept.id));
    drop(repo);
}

#[test]
fn test_batch_writes_once_at_the_end() {
    let test_dir = tempfile::tempdir().unwrap();
    let config = config(test_dir.path());
    let locale = config.locale.clone();

    let mut repo = ConceptRepository::open(&config).unwrap();
    repo.batch(|repo| {
        for name in ["Comrat", "Soroca", "Orhei", "Comrat"] {
            repo.create_or_update(Concept::new(&locale, name, None))?;
        }
        assert!(!config.concepts_file().exists());
        Ok(())
    })
    .unwrap();

    let observer = ConceptRepository::open(&config).unwrap();
    assert_eq!(observer.count(), 3);
    let popularity: u32 = observer.all().iter().map(|c| c.popularity).sum();
    assert_eq!(popularity, 4);
}

#[test]
fn test_files_follow_locale_layout() {
    let test_dir = tempfile::tempdir().unwrap();
    let config = config(test_dir.path());
    let locale = config.locale.clone();

    let mut concepts = ConceptRepository::open(&config).unwrap();
    concepts.create(Concept::new(&locale, "Nistru", None)).unwrap();
    let mut entities = WikiEntityRepository::open(&config).unwrap();
    entities.create(WikiEntity::new("Q217", "Moldova", "ro", vec!["h".to_string()])).unwrap();
    let mut names = WikiSearchNameRepository::open(&config).unwrap();
    names.create(WikiSearchName::new(&locale, "Moldova")).unwrap();
    let mut titles = WikiTitleRepository::open(&config).unwrap();
    titles.create(WikiTitle::new("ro", "Republica Moldova")).unwrap();

    concepts.close().unwrap();
    entities.close().unwrap();
    names.close().unwrap();
    titles.close().unwrap();

    let data_dir = test_dir.path().join("ro-md");
    assert!(data_dir.join("concepts.json").is_file());
    assert!(data_dir.join("wiki-entities.json").is_file());
    assert!(data_dir.join("wiki-search-names.json").is_file());
    assert!(test_dir.path().join("ro-wiki-titles.json").is_file());

    // files are plain JSON arrays of records
    let raw = fs::read_to_string(data_dir.join("wiki-entities.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 1);
    assert_eq!(value[0]["namesHashes"][0], "h");
    assert!(value[0]["createdAt"].is_string());
}

#[test]
fn test_wiki_entities_round_trip_with_indexes() {
    let test_dir = tempfile::tempdir().unwrap();
    let config = config(test_dir.path());

    let mut entity = WikiEntity::new("Q1", "Stefan cel Mare", "ro", vec!["n1".to_string(), "n2".to_string()]);
    entity.partial_names_hashes = vec!["p1".to_string()];
    entity.lastname = Some("Mare".to_string());
    entity.country_codes = Some(vec!["md".to_string(), "ro".to_string()]);

    let created = {
        let mut repo = WikiEntityRepository::open(&config).unwrap();
        let created = repo.create(entity).unwrap();
        repo.close().unwrap();
        created
    };

    let repo = WikiEntityRepository::open(&config).unwrap();
    assert_eq!(repo.get_by_id("Q1"), Some(&created));
    assert_eq!(repo.get_by_name_hash("n2").len(), 1);
    assert_eq!(repo.get_by_partial_name_hash("p1").len(), 1);
}

#[test]
fn test_failed_flush_does_not_count_the_observation() {
    let test_dir = tempfile::tempdir().unwrap();
    let store_dir = test_dir.path().join("store");
    let locale = Locale::new("ro", "md").unwrap();

    let mut repo = ConceptRepository::open_path(store_dir.join("concepts.json")).unwrap();
    let created = repo.create_or_update(Concept::new(&locale, "Soroca", None)).unwrap();

    // a plain file where the directory should be makes every write fail
    fs::remove_dir_all(&store_dir).unwrap();
    fs::write(&store_dir, "").unwrap();

    let err = repo.create_or_update(Concept::new(&locale, "Soroca", None)).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
    assert_eq!(repo.get_by_id(&created.id).unwrap().popularity, 1);

    let err = repo.create(Concept::new(&locale, "Edinet", None)).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
    assert_eq!(repo.count(), 1);

    fs::remove_file(&store_dir).unwrap();
    assert!(repo.create(Concept::new(&locale, "Edinet", None)).is_ok());
    assert_eq!(repo.create_or_update(Concept::new(&locale, "Soroca", None)).unwrap().popularity, 2);
    repo.close().unwrap();

    let reopened = ConceptRepository::open_path(store_dir.join("concepts.json")).unwrap();
    assert_eq!(reopened.count(), 2);
    assert_eq!(reopened.get_by_id(&created.id).unwrap().popularity, 2);
}
