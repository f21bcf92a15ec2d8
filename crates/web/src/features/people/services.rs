use tally_storage::{
    Tracker,
    dto::person::PersonDetailResponse,
    error::Result,
    models::Person,
    repository::Roster,
};

/// List everyone on the roster
pub fn list_people(roster: &Roster) -> Result<Vec<Person>> {
    roster.list()
}

/// Roster entry plus the derived status of each item the person has submitted.
/// Unknown ids yield an empty entry rather than an error.
pub fn get_person(roster: &Roster, tracker: &Tracker, person_id: &str) -> Result<PersonDetailResponse> {
    let person = roster.get(person_id)?;
    let task_status = tracker.status_index(person_id)?;

    Ok(PersonDetailResponse::new(person, task_status))
}

/// Add a single person
pub fn add_person(roster: &Roster, person: Person) -> Result<Person> {
    roster.add(person.clone())?;
    Ok(person)
}

/// Merge an uploaded CSV into the roster and return how many new people it added
pub fn upload_roster(roster: &Roster, csv: &str) -> Result<usize> {
    let incoming = Roster::parse_csv(csv)?;
    let total = incoming.len();
    let added = roster.merge(incoming)?;

    tracing::info!(
        "Roster upload added {} of {} row(s)",
        added.len(),
        total
    );

    Ok(added.len())
}
