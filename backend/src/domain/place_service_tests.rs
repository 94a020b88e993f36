//! Tests for the place service.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeZone, Utc};
use mockall::predicate::eq;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    MockCategoryRepository, MockPlaceCache, MockPlaceRepository, MockReindexMetrics,
    MockReindexQueue, PlaceCacheError, ReindexMetricsError,
};
use crate::domain::{ContextError, ErrorCode};

fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock;

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        fixture_timestamp().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        fixture_timestamp()
    }
}

struct Mocks {
    places: MockPlaceRepository,
    categories: MockCategoryRepository,
    cache: MockPlaceCache,
    reindex: MockReindexQueue,
}

impl Mocks {
    fn into_service(self) -> PlaceService {
        PlaceService::new(
            PlaceServicePorts {
                places: Arc::new(self.places),
                categories: Arc::new(self.categories),
                cache: Arc::new(self.cache),
                reindex: Arc::new(self.reindex),
            },
            Arc::new(FixtureClock),
        )
    }
}

#[fixture]
fn mocks() -> Mocks {
    Mocks {
        places: MockPlaceRepository::new(),
        categories: MockCategoryRepository::new(),
        cache: MockPlaceCache::new(),
        reindex: MockReindexQueue::new(),
    }
}

#[fixture]
fn category() -> Category {
    Category::new(EntityId::generate(), "Parks", 1).expect("valid category")
}

fn draft_for(category: &Category) -> PlaceDraft {
    PlaceDraft {
        name: "Harbour Walk".to_owned(),
        description: "Promenade along the old docks".to_owned(),
        category: category.id().to_string(),
        tags: vec!["waterfront".to_owned()],
    }
}

fn stored_place(category: &Category) -> Place {
    Place::new(PlaceParts {
        id: EntityId::generate(),
        name: "Harbour Walk".to_owned(),
        description: String::new(),
        category: category.id(),
        tags: Vec::new(),
        created_at: Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp"),
        updated_at: None,
    })
    .expect("valid place")
}

fn expect_category_lookup(mocks: &mut Mocks, category: &Category) {
    let found = category.clone();
    mocks
        .categories
        .expect_find()
        .returning(move |_| Ok(found.clone()));
}

fn expect_list_invalidation(mocks: &mut Mocks) {
    mocks
        .cache
        .expect_delete()
        .withf(|keys| keys.len() == 1 && keys[0].as_str() == LIST_PLACES_CACHE_KEY)
        .times(1)
        .returning(|_| Ok(()));
}

#[rstest]
#[tokio::test]
async fn create_writes_invalidates_and_publishes_reindex(mut mocks: Mocks, category: Category) {
    expect_category_lookup(&mut mocks, &category);
    let created = Arc::new(Mutex::new(None));
    let created_slot = Arc::clone(&created);
    mocks.places.expect_create().times(1).returning(move |place| {
        *created_slot.lock().expect("slot lock") = Some(place.clone());
        Ok(place.id())
    });
    expect_list_invalidation(&mut mocks);
    mocks
        .reindex
        .expect_publish_reindex()
        .times(1)
        .returning(|_, _| Ok(()));

    let service = mocks.into_service();
    let id = service
        .create(&RequestContext::background(), draft_for(&category))
        .await
        .expect("create succeeds");

    let place = created
        .lock()
        .expect("slot lock")
        .clone()
        .expect("place was written");
    assert_eq!(place.id(), id);
    assert_eq!(place.name_slug(), "harbour-walk");
    assert_eq!(place.created_at(), fixture_timestamp());
    assert_eq!(place.updated_at(), None);
}

#[rstest]
#[tokio::test]
async fn create_publishes_the_written_identifier(mut mocks: Mocks, category: Category) {
    expect_category_lookup(&mut mocks, &category);
    let written = Arc::new(Mutex::new(None));
    let written_slot = Arc::clone(&written);
    mocks.places.expect_create().returning(move |place| {
        *written_slot.lock().expect("slot lock") = Some(place.id());
        Ok(place.id())
    });
    expect_list_invalidation(&mut mocks);
    let published = Arc::clone(&written);
    mocks
        .reindex
        .expect_publish_reindex()
        .withf(move |_, id| *published.lock().expect("slot lock") == Some(*id))
        .times(1)
        .returning(|_, _| Ok(()));

    let service = mocks.into_service();
    service
        .create(&RequestContext::background(), draft_for(&category))
        .await
        .expect("create succeeds");
}

#[rstest]
#[case(
    ReindexError::routing_failure("c-1", 312_u16, "NO_ROUTE", "reindex", "place"),
    ErrorCode::InternalError
)]
#[case(ReindexError::broker_rejected(4_u64, 0_u32), ErrorCode::InternalError)]
#[case(ReindexError::publish("channel closed"), ErrorCode::ServiceUnavailable)]
#[case(
    ReindexError::cancelled(ContextError::DeadlineExceeded),
    ErrorCode::ServiceUnavailable
)]
#[tokio::test]
async fn create_fails_when_reindex_fails_after_write(
    mut mocks: Mocks,
    category: Category,
    #[case] failure: ReindexError,
    #[case] expected: ErrorCode,
) {
    expect_category_lookup(&mut mocks, &category);
    mocks
        .places
        .expect_create()
        .times(1)
        .returning(|place| Ok(place.id()));
    expect_list_invalidation(&mut mocks);
    mocks
        .reindex
        .expect_publish_reindex()
        .times(1)
        .return_once(move |_, _| Err(failure));

    let service = mocks.into_service();
    let error = service
        .create(&RequestContext::background(), draft_for(&category))
        .await
        .expect_err("reindex failure surfaces");

    assert_eq!(error.code(), expected);
}

#[rstest]
#[tokio::test]
async fn create_rejects_unknown_category_without_writing(mut mocks: Mocks, category: Category) {
    mocks
        .categories
        .expect_find()
        .returning(|id| Err(CategoryRepositoryError::not_found(id.to_string())));
    mocks.places.expect_create().times(0);
    mocks.reindex.expect_publish_reindex().times(0);

    let service = mocks.into_service();
    let error = service
        .create(&RequestContext::background(), draft_for(&category))
        .await
        .expect_err("unknown category");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn create_rejects_malformed_category_identifier(mut mocks: Mocks, category: Category) {
    mocks.categories.expect_find().times(0);
    mocks.places.expect_create().times(0);

    let mut draft = draft_for(&category);
    draft.category = "not-an-id".to_owned();

    let service = mocks.into_service();
    let error = service
        .create(&RequestContext::background(), draft)
        .await
        .expect_err("malformed category");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn update_keeps_created_at_and_stamps_updated_at(mut mocks: Mocks, category: Category) {
    let existing = stored_place(&category);
    let id = existing.id();
    let created_at = existing.created_at();
    expect_category_lookup(&mut mocks, &category);
    mocks
        .places
        .expect_find()
        .returning(move |_| Ok(existing.clone()));
    mocks
        .places
        .expect_update()
        .withf(move |place| {
            place.id() == id
                && place.created_at() == created_at
                && place.updated_at() == Some(fixture_timestamp())
        })
        .times(1)
        .returning(|_| Ok(()));
    expect_list_invalidation(&mut mocks);
    mocks
        .reindex
        .expect_publish_reindex()
        .withf(move |_, published| *published == id)
        .times(1)
        .returning(|_, _| Ok(()));

    let service = mocks.into_service();
    service
        .update(&RequestContext::background(), id, draft_for(&category))
        .await
        .expect("update succeeds");
}

#[rstest]
#[tokio::test]
async fn update_of_missing_place_is_not_found(mut mocks: Mocks, category: Category) {
    mocks
        .places
        .expect_find()
        .returning(|id| Err(PlaceRepositoryError::not_found(id.to_string())));
    mocks.places.expect_update().times(0);
    mocks.reindex.expect_publish_reindex().times(0);

    let service = mocks.into_service();
    let error = service
        .update(
            &RequestContext::background(),
            EntityId::generate(),
            draft_for(&category),
        )
        .await
        .expect_err("missing place");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn delete_publishes_reindex_for_removed_place(mut mocks: Mocks) {
    let id = EntityId::generate();
    mocks
        .places
        .expect_delete()
        .withf(move |deleted| *deleted == id)
        .times(1)
        .returning(|_| Ok(()));
    expect_list_invalidation(&mut mocks);
    mocks
        .reindex
        .expect_publish_reindex()
        .withf(move |_, published| *published == id)
        .times(1)
        .returning(|_, _| Ok(()));

    let service = mocks.into_service();
    service
        .delete(&RequestContext::background(), id)
        .await
        .expect("delete succeeds");
}

#[rstest]
#[tokio::test]
async fn reindex_outcomes_are_counted_even_when_exporting_fails(mut mocks: Mocks) {
    mocks.places.expect_delete().returning(|_| Ok(()));
    expect_list_invalidation(&mut mocks);
    mocks
        .reindex
        .expect_publish_reindex()
        .returning(|_, _| Err(ReindexError::broker_rejected(9_u64, 1_u32)));
    let mut metrics = MockReindexMetrics::new();
    metrics
        .expect_record()
        .with(eq(ReindexOutcome::Rejected))
        .times(1)
        .returning(|_| Err(ReindexMetricsError::export("registry gone")));

    let service = mocks.into_service().with_metrics(Arc::new(metrics));
    let error = service
        .delete(&RequestContext::background(), EntityId::generate())
        .await
        .expect_err("rejected publish fails the delete");

    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[rstest]
#[tokio::test]
async fn delete_maps_connection_failure_and_skips_reindex(mut mocks: Mocks) {
    mocks
        .places
        .expect_delete()
        .returning(|_| Err(PlaceRepositoryError::connection("pool exhausted")));
    mocks.cache.expect_delete().times(0);
    mocks.reindex.expect_publish_reindex().times(0);

    let service = mocks.into_service();
    let error = service
        .delete(&RequestContext::background(), EntityId::generate())
        .await
        .expect_err("connection failure");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn failed_invalidation_skips_reindex(mut mocks: Mocks) {
    mocks.places.expect_delete().returning(|_| Ok(()));
    mocks
        .cache
        .expect_delete()
        .returning(|_| Err(PlaceCacheError::backend("redis down")));
    mocks.reindex.expect_publish_reindex().times(0);

    let service = mocks.into_service();
    let error = service
        .delete(&RequestContext::background(), EntityId::generate())
        .await
        .expect_err("invalidation failure");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn list_places_serves_cache_hits(mut mocks: Mocks, category: Category) {
    let cached = vec![stored_place(&category)];
    let expected = cached.clone();
    mocks
        .cache
        .expect_get()
        .withf(|key| key.as_str() == LIST_PLACES_CACHE_KEY)
        .returning(move |_| Ok(Some(cached.clone())));
    mocks.places.expect_find_all().times(0);

    let service = mocks.into_service();
    let places = service.list_places().await.expect("list succeeds");
    assert_eq!(places, expected);
}

#[rstest]
#[tokio::test]
async fn list_places_fills_cache_on_miss(mut mocks: Mocks, category: Category) {
    let stored = vec![stored_place(&category)];
    let expected = stored.clone();
    mocks.cache.expect_get().returning(|_| Ok(None));
    mocks
        .places
        .expect_find_all()
        .times(1)
        .returning(move || Ok(stored.clone()));
    mocks
        .cache
        .expect_set()
        .withf(|key, places, ttl| {
            key.as_str() == LIST_PLACES_CACHE_KEY && places.len() == 1 && *ttl == PLACES_CACHE_TTL
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let service = mocks.into_service();
    let places = service.list_places().await.expect("list succeeds");
    assert_eq!(places, expected);
}

#[rstest]
#[tokio::test]
async fn list_places_survives_cache_outage(mut mocks: Mocks) {
    mocks
        .cache
        .expect_get()
        .returning(|_| Err(PlaceCacheError::backend("timeout")));
    mocks.places.expect_find_all().returning(|| Ok(Vec::new()));
    mocks
        .cache
        .expect_set()
        .returning(|_, _, _| Err(PlaceCacheError::backend("timeout")));

    let service = mocks.into_service();
    let places = service.list_places().await.expect("cache outage is tolerated");
    assert!(places.is_empty());
}

#[rstest]
#[tokio::test]
async fn search_uses_hashed_cache_key(mut mocks: Mocks) {
    mocks
        .cache
        .expect_get()
        .withf(|key| {
            key.as_str()
                .starts_with(&format!("{SEARCH_PLACES_CACHE_PREFIX}:"))
                && !key.as_str().contains(' ')
        })
        .returning(|_| Ok(None));
    mocks
        .places
        .expect_search()
        .withf(|query| query == "old town")
        .times(1)
        .returning(|_| Ok(Vec::new()));
    mocks.cache.expect_set().returning(|_, _, _| Ok(()));

    let service = mocks.into_service();
    service
        .search_places("  old town ".to_owned())
        .await
        .expect("search succeeds");
}

#[rstest]
#[tokio::test]
async fn search_rejects_blank_queries(mut mocks: Mocks) {
    mocks.places.expect_search().times(0);

    let service = mocks.into_service();
    let error = service
        .search_places("   ".to_owned())
        .await
        .expect_err("blank query");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn find_category_maps_not_found(mut mocks: Mocks) {
    mocks
        .categories
        .expect_find()
        .returning(|id| Err(CategoryRepositoryError::not_found(id.to_string())));

    let service = mocks.into_service();
    let error = service
        .find_category(EntityId::generate())
        .await
        .expect_err("missing category");
    assert_eq!(error.code(), ErrorCode::NotFound);
}
