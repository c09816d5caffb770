use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future;
use shopload::{
    by_key, group_by, FlushTrigger, LoadError, LoaderConfig, LoaderId, LoaderRegistry,
    RegistryError, StoreError, UnitOfWork,
};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq)]
struct Author {
    id: u32,
    name: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
struct Book {
    id: u32,
    author_id: u32,
    title: &'static str,
}

const AUTHOR: LoaderId<u32, Author> = LoaderId::new("author");
const BOOKS_BY_AUTHOR: LoaderId<u32, Vec<Book>> = LoaderId::new("books_by_author");

type Calls = Arc<Mutex<Vec<(&'static str, Vec<u32>)>>>;

fn authors() -> Vec<Author> {
    vec![Author { id: 1, name: "Le Guin" }, Author { id: 2, name: "Lem" }]
}

fn books() -> Vec<Book> {
    vec![
        Book { id: 10, author_id: 1, title: "The Dispossessed" },
        Book { id: 11, author_id: 2, title: "Solaris" },
        Book { id: 12, author_id: 1, title: "The Lathe of Heaven" },
    ]
}

fn registry(config: LoaderConfig) -> (LoaderRegistry, Calls) {
    let calls: Calls = Arc::default();
    let mut registry = LoaderRegistry::new(config);

    let author_calls = calls.clone();
    let book_calls = calls.clone();
    registry
        .register(
            AUTHOR,
            by_key(
                move |ids: Vec<u32>| {
                    author_calls.lock().unwrap().push(("author", ids.clone()));
                    async move {
                        Ok::<_, StoreError>(
                            authors()
                                .into_iter()
                                .filter(|a| ids.contains(&a.id))
                                .collect::<Vec<_>>(),
                        )
                    }
                },
                |author: &Author| author.id,
            ),
        )
        .unwrap()
        .register(
            BOOKS_BY_AUTHOR,
            group_by(
                move |ids: Vec<u32>| {
                    book_calls.lock().unwrap().push(("books", ids.clone()));
                    async move {
                        Ok::<_, StoreError>(
                            books()
                                .into_iter()
                                .filter(|b| ids.contains(&b.author_id))
                                .collect::<Vec<_>>(),
                        )
                    }
                },
                |book: &Book| book.author_id,
            ),
        )
        .unwrap();
    (registry, calls)
}

fn failing_registry() -> LoaderRegistry {
    let mut registry = LoaderRegistry::new(LoaderConfig::default());
    registry
        .register(
            AUTHOR,
            by_key(
                |_ids: Vec<u32>| async {
                    Err::<Vec<Author>, _>(StoreError::Query(
                        "relation \"authors\" does not exist".to_owned(),
                    ))
                },
                |author: &Author| author.id,
            ),
        )
        .unwrap();
    registry
}

struct Gate(Arc<Semaphore>);

#[async_trait]
impl FlushTrigger for Gate {
    async fn ready(&self) {
        self.0.acquire().await.unwrap().forget();
    }
}

#[tokio::test]
async fn same_key_is_fetched_once_per_unit_of_work() {
    let (registry, calls) = registry(LoaderConfig::default());
    let uow = UnitOfWork::begin(&registry);

    let results = future::join_all((0..5).map(|_| uow.load(&AUTHOR, 1))).await;
    let again = uow.load(&AUTHOR, 1).await.unwrap().unwrap();

    for result in results {
        assert!(Arc::ptr_eq(&result.unwrap().unwrap(), &again));
    }
    assert_eq!(*calls.lock().unwrap(), vec![("author", vec![1])]);
}

#[tokio::test]
async fn distinct_keys_share_one_bulk_fetch() {
    let (registry, calls) = registry(LoaderConfig::default());
    let uow = UnitOfWork::begin(&registry);

    let (a, b, c) =
        future::join3(uow.load(&AUTHOR, 2), uow.load(&AUTHOR, 1), uow.load(&AUTHOR, 3)).await;

    assert_eq!(a.unwrap().unwrap().name, "Lem");
    assert_eq!(b.unwrap().unwrap().name, "Le Guin");
    assert_eq!(c.unwrap(), None);
    assert_eq!(*calls.lock().unwrap(), vec![("author", vec![1, 2, 3])]);
}

#[tokio::test]
async fn has_many_groups_rows_and_yields_empty_sequences() {
    let (registry, calls) = registry(LoaderConfig::default());
    let uow = UnitOfWork::begin(&registry);

    let books = uow.load_many(&BOOKS_BY_AUTHOR, vec![1, 2, 3]).await.unwrap();
    let titles = books
        .iter()
        .map(|books| books.as_ref().unwrap().iter().map(|b| b.title).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    assert_eq!(
        titles,
        vec![vec!["The Dispossessed", "The Lathe of Heaven"], vec!["Solaris"], vec![]]
    );
    assert_eq!(*calls.lock().unwrap(), vec![("books", vec![1, 2, 3])]);
}

#[tokio::test]
async fn units_of_work_never_share_cache_entries() {
    let (registry, calls) = registry(LoaderConfig::default());
    let first = UnitOfWork::begin(&registry);
    let second = UnitOfWork::begin(&registry);
    assert_ne!(first.id(), second.id());

    let (a, b) = future::join(first.load(&AUTHOR, 1), second.load(&AUTHOR, 1)).await;
    let (a, b) = (a.unwrap().unwrap(), b.unwrap().unwrap());

    assert_eq!(a, b);
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn a_new_unit_of_work_starts_with_an_empty_cache() {
    let (registry, calls) = registry(LoaderConfig::default());

    let uow = UnitOfWork::begin(&registry);
    uow.load(&AUTHOR, 1).await.unwrap();
    uow.finish();

    let uow = UnitOfWork::begin(&registry);
    uow.load(&AUTHOR, 1).await.unwrap();

    assert_eq!(*calls.lock().unwrap(), vec![("author", vec![1]), ("author", vec![1])]);
}

#[tokio::test]
async fn batch_failure_reaches_every_waiter() {
    let registry = failing_registry();
    let uow = UnitOfWork::begin(&registry);

    let results = future::join_all([1, 2, 3].map(|id| uow.load(&AUTHOR, id))).await;

    assert_eq!(results.len(), 3);
    for result in results {
        match result {
            Err(LoadError::Fetch { loader: "author", source }) => {
                assert!(matches!(*source, StoreError::Query(_)))
            }
            other => panic!("expected a fetch error, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn abort_cancels_pending_requests() {
    let gate = Arc::new(Semaphore::new(0));
    let (registry, calls) = registry(LoaderConfig::default().with_flush(Gate(gate)));
    let uow = UnitOfWork::begin(&registry);

    let (pending, ()) = tokio::join!(uow.load(&AUTHOR, 1), async {
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        uow.abort();
    });

    assert!(uow.is_aborted());
    assert!(matches!(pending, Err(LoadError::Cancelled("author"))));
    assert!(calls.lock().unwrap().is_empty());
}

#[cfg(debug_assertions)]
#[tokio::test]
#[should_panic(expected = "used after its unit of work ended")]
async fn loading_after_abort_panics_in_debug_builds() {
    let (registry, _) = registry(LoaderConfig::default());
    let uow = UnitOfWork::begin(&registry);
    uow.abort();
    let _ = uow.load(&BOOKS_BY_AUTHOR, 1).await;
}

#[cfg(not(debug_assertions))]
#[tokio::test]
async fn loading_after_abort_fails_in_release_builds() {
    let (registry, calls) = registry(LoaderConfig::default());
    let uow = UnitOfWork::begin(&registry);
    uow.abort();

    assert!(matches!(
        uow.load(&BOOKS_BY_AUTHOR, 1).await,
        Err(LoadError::UnitOfWorkEnded("books_by_author"))
    ));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn hundreds_of_keys_in_one_window_share_one_bulk_fetch() {
    let (registry, calls) = registry(LoaderConfig::default());
    let uow = UnitOfWork::begin(&registry);

    let results = future::join_all((1..=300).map(|id| uow.load(&AUTHOR, id))).await;

    assert_eq!(results.iter().filter(|r| matches!(r, Ok(Some(_)))).count(), 2);
    assert_eq!(*calls.lock().unwrap(), vec![("author", (1..=300).collect::<Vec<_>>())]);
}

#[tokio::test]
async fn unknown_and_mistyped_loaders_are_rejected() {
    let (registry, _) = registry(LoaderConfig::default());
    let uow = UnitOfWork::begin(&registry);

    const PUBLISHER: LoaderId<u32, String> = LoaderId::new("publisher");
    const AUTHOR_BY_NAME: LoaderId<String, Author> = LoaderId::new("author");

    assert!(matches!(uow.load(&PUBLISHER, 1).await, Err(LoadError::UnknownLoader("publisher"))));
    assert!(matches!(
        uow.load(&AUTHOR_BY_NAME, "Lem".to_owned()).await,
        Err(LoadError::TypeMismatch("author"))
    ));
}

#[tokio::test]
async fn registering_a_name_twice_fails() {
    let (mut registry, _) = registry(LoaderConfig::default());
    assert!(registry.contains("author"));

    let result = registry.register(
        AUTHOR,
        by_key(
            |_ids: Vec<u32>| async { Ok::<Vec<Author>, StoreError>(Vec::new()) },
            |author: &Author| author.id,
        ),
    );

    assert!(matches!(result, Err(RegistryError::DuplicateLoader("author"))));
}
