use clap::Args;
use reidentify::documents::{self, doc, RequestId};
use reidentify::error::AppError;
use reidentify::requests::{Listing, RequestWorkflowService, TransitionOutcome, UnknownStatusPolicy};
use reidentify::store::{Collection, InMemoryRequestStore};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Status sent for the third seeded request.
    #[arg(long, default_value = "on-hold")]
    pub(crate) status: String,
    /// Delete requests with unrecognized statuses instead of refusing the update.
    #[arg(long)]
    pub(crate) discard_unknown: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        status,
        discard_unknown,
    } = args;

    let policy = if discard_unknown {
        UnknownStatusPolicy::Discard
    } else {
        UnknownStatusPolicy::Reject
    };

    let store = InMemoryRequestStore::default();
    let ids = seed_demo_store(&store);
    let service = RequestWorkflowService::new(Arc::new(store.clone()), policy);

    println!("ID card request review demo (in-memory store)");
    render_counts("Before review", &store);

    println!("\nDecisions");
    let decisions = [
        (ids[0], "approved".to_string()),
        (ids[1], "rejected".to_string()),
        (ids[2], status),
    ];
    for (id, status) in &decisions {
        match service.update_status(&id.to_string(), status).await {
            Ok(TransitionOutcome::Moved { destination }) => {
                println!("- {id} -> '{status}': moved to {}", destination.label())
            }
            Ok(TransitionOutcome::Discarded) => {
                println!("- {id} -> '{status}': discarded (no copy kept)")
            }
            Err(err) => println!("- {id} -> '{status}': refused ({err})"),
        }
    }

    render_counts("\nAfter review", &store);

    println!("\nFaculty allow-list");
    for faculty_number in ["SONA-F-118", "SONA-F-999"] {
        match service.check_faculty(faculty_number).await {
            Ok(valid) => println!("- {faculty_number}: valid={valid}"),
            Err(err) => println!("- {faculty_number}: lookup unavailable ({err})"),
        }
    }

    match service.list(Listing::Approved).await {
        Ok(approved) => {
            let payload: Vec<_> = approved.into_iter().map(documents::to_json).collect();
            match serde_json::to_string_pretty(&payload) {
                Ok(json) => println!("\nApproved listing payload:\n{json}"),
                Err(err) => println!("\nApproved listing payload unavailable: {err}"),
            }
        }
        Err(err) => println!("\nApproved listing unavailable: {err}"),
    }

    Ok(())
}

fn seed_demo_store(store: &InMemoryRequestStore) -> Vec<RequestId> {
    store.seed(Collection::Faculty, vec![doc! { "facNumber": "SONA-F-118" }]);
    store.seed(
        Collection::Pending,
        vec![
            doc! {
                "name": "Nisha R",
                "registerNumber": "312221205011",
                "department": "IT",
                "reason": "Card lost",
            },
            doc! {
                "name": "Gokul S",
                "registerNumber": "312221205027",
                "department": "IT",
                "reason": "Photo mismatch",
            },
            doc! {
                "name": "Harini K",
                "registerNumber": "312221205031",
                "department": "ECE",
                "reason": "Name correction",
            },
        ],
    )
}

fn render_counts(heading: &str, store: &InMemoryRequestStore) {
    println!("{heading}");
    for collection in [Collection::Pending, Collection::Approved, Collection::Rejected] {
        println!("- {}: {}", collection.label(), store.len(collection));
    }
}
