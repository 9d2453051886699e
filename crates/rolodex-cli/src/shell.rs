use color_eyre::eyre::Result;
use owo_colors::OwoColorize;
use serde::Serialize;

use rolodex_core::{ContactStatistics, Envelope, Failure, Group, GroupStatistics};
use rolodex_service::{
    Contact, ContactField, ContactInput, ContactSortField, GroupInput, GroupSortField,
    ProfileUpdate, Registration, RolodexService, Session, UserSummary,
};

use crate::prompt::{confirm, is_input_closed, print_box, read_id, read_line, read_optional};

const LIST_LIMIT: usize = 50;

pub struct Shell {
    service: RolodexService,
    session: Option<Session>,
    json: bool,
}

impl Shell {
    pub fn new(service: RolodexService, json: bool) -> Self {
        Self {
            service,
            session: None,
            json,
        }
    }

    /// Runs until the user quits or standard input closes.
    pub async fn run(&mut self) -> Result<()> {
        match self.menus().await {
            Err(e) if is_input_closed(&e) => {}
            other => other?,
        }
        if let Some(session) = self.session.take() {
            self.service.logout(session);
        }
        println!("👋 Bye");
        Ok(())
    }

    async fn menus(&mut self) -> Result<()> {
        loop {
            let keep_going = match self.session.clone() {
                None => self.guest_menu().await?,
                Some(session) => {
                    self.session_menu(&session).await?;
                    true
                }
            };
            if !keep_going {
                return Ok(());
            }
        }
    }

    /// Print the outcome and hand back the value on success.
    fn report<T, E>(&self, result: std::result::Result<T, E>, key: &str, message: &str) -> Option<T>
    where
        T: Serialize,
        E: Failure,
    {
        match result {
            Ok(value) => {
                if self.json {
                    print_envelope(&Envelope::ok(message).with(key, &value));
                } else {
                    println!("{} {}", "✅".green(), message);
                }
                Some(value)
            }
            Err(e) => {
                if self.json {
                    print_envelope(&Envelope::from_error(&e));
                } else {
                    println!("{} {}", "❌", e.to_string().red());
                }
                None
            }
        }
    }

    async fn guest_menu(&mut self) -> Result<bool> {
        print_box(
            "ROLODEX",
            &[
                ("1", "Register"),
                ("2", "Login"),
                ("3", "Forgot password"),
                ("0", "Exit"),
            ],
        );

        match read_line("Choice: ")?.as_str() {
            "1" => self.register().await?,
            "2" => self.login().await?,
            "3" => self.forgot_password().await?,
            "0" => return Ok(false),
            _ => println!("❌ Invalid choice"),
        }
        Ok(true)
    }

    async fn session_menu(&mut self, session: &Session) -> Result<()> {
        let mut items = vec![
            ("1", "List contacts"),
            ("2", "Add contact"),
            ("3", "Edit contact"),
            ("4", "Delete contact"),
            ("5", "Search contacts"),
            ("6", "Sort contacts"),
            ("7", "Filter by group"),
            ("8", "Assign group"),
            ("9", "List groups"),
            ("10", "Add group"),
            ("11", "Rename group"),
            ("12", "Delete group"),
            ("13", "Shared groups"),
            ("14", "View profile"),
            ("15", "Update profile"),
        ];
        if session.is_admin {
            items.extend([
                ("20", "List users"),
                ("21", "Search users"),
                ("22", "Delete user"),
                ("23", "Reset user password"),
                ("24", "Statistics"),
            ]);
        }
        items.push(("0", "Logout"));
        print_box(&format!("ROLODEX - {}", session.username), &items);

        match read_line("Choice: ")?.as_str() {
            "1" => self.list_contacts(session).await,
            "2" => self.add_contact(session).await?,
            "3" => self.edit_contact(session).await?,
            "4" => self.delete_contact(session).await?,
            "5" => self.search_contacts(session).await?,
            "6" => self.sort_contacts(session).await?,
            "7" => self.filter_by_group(session).await?,
            "8" => self.assign_group(session).await?,
            "9" => self.list_groups(session).await,
            "10" => self.add_group(session).await?,
            "11" => self.rename_group(session).await?,
            "12" => self.delete_group(session).await?,
            "13" => self.shared_groups().await,
            "14" => self.view_profile(session).await,
            "15" => self.update_profile(session).await?,
            "20" if session.is_admin => self.list_users(session).await,
            "21" if session.is_admin => self.search_users(session).await?,
            "22" if session.is_admin => self.delete_user(session).await?,
            "23" if session.is_admin => self.reset_user_password(session).await?,
            "24" if session.is_admin => self.statistics(session).await,
            "0" => {
                if let Some(session) = self.session.take() {
                    self.service.logout(session);
                }
            }
            _ => println!("❌ Invalid choice"),
        }
        Ok(())
    }

    async fn register(&mut self) -> Result<()> {
        let username = read_line("Username: ")?;
        let password = read_line("Password: ")?;
        let fullname = read_line("Full name (optional): ")?;
        let email = read_line("Email (optional): ")?;
        let question = read_line("Security question (blank for default): ")?;
        let answer = read_line("Security answer: ")?;

        let mut registration = Registration::new(username, password).security(question, answer);
        registration.fullname = fullname;
        registration.email = email;

        let result = self.service.register(registration).await;
        self.report(result.map(|a| a.profile()), "user", "Registration successful");
        Ok(())
    }

    async fn login(&mut self) -> Result<()> {
        let username = read_line("Username: ")?;
        let password = read_line("Password: ")?;
        let result = self.service.login(&username, &password).await;
        self.session = self.report(result, "session", "Login successful");
        Ok(())
    }

    async fn forgot_password(&mut self) -> Result<()> {
        let username = read_line("Username: ")?;
        let Some(question) = self.report(
            self.service.security_question(&username).await,
            "question",
            "Security question found",
        ) else {
            return Ok(());
        };

        println!("❓ {}", question);
        let answer = read_line("Answer: ")?;
        let verified = self.service.verify_security_answer(&username, &answer).await;
        if self.report(verified, "verified", "Answer accepted").is_none() {
            return Ok(());
        }

        let new_password = read_line("New password: ")?;
        let result = self
            .service
            .reset_password(&username, &answer, &new_password)
            .await;
        self.report(result, "reset", "Password reset, you can log in now");
        Ok(())
    }

    async fn list_contacts(&self, session: &Session) {
        let result = self.service.contacts(session).get_all().await;
        if let Some(contacts) = self.report(result, "contacts", "Contacts loaded") {
            print_contacts(&contacts);
        }
    }

    async fn add_contact(&self, session: &Session) -> Result<()> {
        let input = ContactInput::new(read_line("Name: ")?, read_line("Phone: ")?)
            .email(read_line("Email (optional): ")?)
            .address(read_line("Address (optional): ")?)
            .group(read_line("Group (optional): ")?)
            .notes(read_line("Notes (optional): ")?);

        let result = self.service.contacts(session).add(input).await;
        self.report(result, "contact", "Contact added");
        Ok(())
    }

    async fn edit_contact(&self, session: &Session) -> Result<()> {
        let Some(id) = read_id("Contact ID: ")? else {
            println!("❌ Invalid ID");
            return Ok(());
        };
        let mut contacts = self.service.contacts(session);
        let Some(current) = self.report(contacts.get(id).await, "contact", "Editing contact")
        else {
            return Ok(());
        };

        println!("(leave blank to keep the current value)");
        let keep = |value: Option<String>, current: &str| value.unwrap_or_else(|| current.to_string());
        let input = ContactInput::new(
            keep(read_optional(&format!("Name [{}]: ", current.name))?, &current.name),
            keep(read_optional(&format!("Phone [{}]: ", current.phone))?, &current.phone),
        )
        .email(keep(read_optional(&format!("Email [{}]: ", current.email))?, &current.email))
        .address(keep(
            read_optional(&format!("Address [{}]: ", current.address))?,
            &current.address,
        ))
        .group(keep(read_optional(&format!("Group [{}]: ", current.group))?, &current.group))
        .notes(keep(read_optional(&format!("Notes [{}]: ", current.notes))?, &current.notes));

        let result = contacts.update(id, input).await;
        self.report(result, "contact", "Contact updated");
        Ok(())
    }

    async fn delete_contact(&self, session: &Session) -> Result<()> {
        let Some(id) = read_id("Contact ID: ")? else {
            println!("❌ Invalid ID");
            return Ok(());
        };
        if !confirm("Delete this contact?")? {
            return Ok(());
        }
        let result = self.service.contacts(session).delete(id).await;
        self.report(result, "contact", "Contact deleted");
        Ok(())
    }

    async fn search_contacts(&self, session: &Session) -> Result<()> {
        let query = read_line("Search: ")?;
        let fields: Vec<ContactField> = read_line("Fields (comma separated, blank for all): ")?
            .split(',')
            .filter_map(ContactField::parse)
            .collect();

        let result = self.service.contacts(session).search(&query, &fields).await;
        if let Some(contacts) = self.report(result, "contacts", "Search finished") {
            print_contacts(&contacts);
        }
        Ok(())
    }

    async fn sort_contacts(&self, session: &Session) -> Result<()> {
        let field = ContactSortField::parse_or_default(&read_line(
            "Sort by (name, phone, email, created_at, updated_at): ",
        )?);
        let reverse = confirm("Descending?")?;
        let mut contacts = self.service.contacts(session);

        if confirm("Save this order?")? {
            let result = contacts.sort_and_save(field, reverse).await;
            self.report(result, "field", &format!("Saved order by {}", field.as_str()));
        }
        let result = contacts.sort(field, reverse).await;
        if let Some(sorted) = self.report(result, "contacts", "Sorted") {
            print_contacts(&sorted);
        }
        Ok(())
    }

    async fn filter_by_group(&self, session: &Session) -> Result<()> {
        let mut contacts = self.service.contacts(session);
        if let Ok(names) = contacts.group_names().await {
            if !names.is_empty() {
                println!("Groups in use: {}", names.join(", "));
            }
        }
        let group = read_line("Group (blank for ungrouped): ")?;
        let result = contacts.filter_by_group(&group).await.map(|found| {
            rolodex_service::sort_contacts(found, ContactSortField::Name, false)
        });
        if let Some(found) = self.report(result, "contacts", "Filtered") {
            print_contacts(&found);
        }
        Ok(())
    }

    async fn assign_group(&self, session: &Session) -> Result<()> {
        let Some(id) = read_id("Contact ID: ")? else {
            println!("❌ Invalid ID");
            return Ok(());
        };
        let names = self.service.groups(session).names().await;
        if !names.is_empty() {
            println!("Known groups: {}", names.join(", "));
        }
        let group = read_line("Group (blank to clear): ")?;
        let result = self.service.contacts(session).assign_to_group(id, &group).await;
        self.report(result, "contact", "Group assigned");
        Ok(())
    }

    async fn list_groups(&self, session: &Session) {
        let mut groups = self.service.groups(session);
        let sorted = groups.sort(GroupSortField::Name, false).await;
        print_groups(&sorted);
        let stats = groups.statistics().await;
        if self.json {
            print_envelope(&Envelope::ok("Group statistics").with("statistics", &stats));
        } else {
            print_group_statistics(&stats);
        }
    }

    async fn add_group(&self, session: &Session) -> Result<()> {
        let mut input = GroupInput::new(read_line("Name: ")?);
        if let Some(color) = read_optional("Color (blank for automatic): ")? {
            input = input.color(color);
        }
        if let Some(description) = read_optional("Description (optional): ")? {
            input = input.description(description);
        }
        if session.is_admin {
            input = input.shared(true);
        }

        let result = self.service.groups(session).add(input).await;
        self.report(result, "group", "Group added");
        Ok(())
    }

    async fn rename_group(&self, session: &Session) -> Result<()> {
        let Some(id) = read_id("Group ID: ")? else {
            println!("❌ Invalid ID");
            return Ok(());
        };
        let name = read_line("New name: ")?;
        let result = self.service.groups(session).update(id, GroupInput::new(name)).await;
        if self.report(result, "group", "Group renamed").is_some() {
            println!("ℹ️  Contacts keep their previous group text");
        }
        Ok(())
    }

    async fn delete_group(&self, session: &Session) -> Result<()> {
        let Some(id) = read_id("Group ID: ")? else {
            println!("❌ Invalid ID");
            return Ok(());
        };
        if !confirm("Delete this group?")? {
            return Ok(());
        }
        let result = self
            .service
            .groups(session)
            .delete(id)
            .await
            .map(|group| group.name);
        self.report(result, "name", "Group deleted");
        Ok(())
    }

    async fn shared_groups(&self) {
        let groups = self.service.shared_groups().get_all().await;
        print_groups(&groups);
    }

    async fn view_profile(&self, session: &Session) {
        let result = self.service.profile(session).await;
        if let Some(profile) = self.report(result, "user", "Profile") {
            if !self.json {
                println!("  👤 {} ({})", profile.username.bold(), profile.fullname);
                println!("  ✉️  {}", profile.email);
                println!("  📞 {}", profile.phone);
                println!("  🕒 member since {}", profile.created_at.format("%Y-%m-%d"));
            }
        }
    }

    async fn update_profile(&self, session: &Session) -> Result<()> {
        println!("(leave blank to keep the current value)");
        let update = ProfileUpdate {
            fullname: read_optional("Full name: ")?,
            email: read_optional("Email: ")?,
            phone: read_optional("Phone: ")?,
            avatar: read_optional("Avatar: ")?,
        };
        let result = self.service.update_profile(session, update).await;
        self.report(result, "user", "Profile updated");
        Ok(())
    }

    async fn list_users(&self, session: &Session) {
        let result = self.service.list_users(session).await;
        if let Some(users) = self.report(result, "users", "Users loaded") {
            print_users(&users);
        }
    }

    async fn search_users(&self, session: &Session) -> Result<()> {
        let query = read_line("Username contains: ")?;
        let result = self.service.search_users(session, &query).await;
        if let Some(users) = self.report(result, "users", "Search finished") {
            print_users(&users);
        }
        Ok(())
    }

    async fn delete_user(&self, session: &Session) -> Result<()> {
        let username = read_line("Username: ")?;
        if !confirm(&format!("Delete {} and all their data?", username))? {
            return Ok(());
        }
        let result = self
            .service
            .delete_user(session, &username)
            .await
            .map(|a| a.profile());
        self.report(result, "user", "User deleted");
        Ok(())
    }

    async fn reset_user_password(&self, session: &Session) -> Result<()> {
        let username = read_line("Username: ")?;
        let password = read_line("New password: ")?;
        let result = self
            .service
            .set_user_password(session, &username, &password)
            .await;
        self.report(result, "reset", "Password changed");
        Ok(())
    }

    async fn statistics(&self, session: &Session) {
        let result = self.service.system_stats(session).await;
        if let Some(stats) = self.report(result, "statistics", "System statistics") {
            if !self.json {
                println!("  👥 Users: {}", stats.total_users);
                println!("  📇 Contacts: {}", stats.total_contacts);
                println!("  🆕 Registered in the last 7 days: {}", stats.recent_registrations);
                println!("  📊 Contacts per user: {:.2}", stats.avg_contacts_per_user);
            }
        }

        let mut contacts = self.service.contacts(session);
        if let Ok(own) = contacts.statistics().await {
            print_contact_statistics(&own);
        }
    }
}

fn print_envelope(envelope: &Envelope) {
    match serde_json::to_string_pretty(envelope) {
        Ok(json) => println!("{}", json),
        Err(_) => println!("{}", envelope.to_json()),
    }
}

fn print_contacts(contacts: &[Contact]) {
    if contacts.is_empty() {
        println!("📭 No contacts found");
        return;
    }
    println!("\n📇 Contacts ({}):", contacts.len());
    for contact in contacts.iter().take(LIST_LIMIT) {
        let group = if contact.group.is_empty() {
            String::new()
        } else {
            format!(" [{}]", contact.group)
        };
        println!(
            "  {:>4}. {} - {}{} {}",
            contact.id,
            contact.name.bold(),
            contact.phone,
            group.cyan(),
            contact.email.dimmed()
        );
    }
    if contacts.len() > LIST_LIMIT {
        println!("  ... and {} more", contacts.len() - LIST_LIMIT);
    }
}

fn print_groups(groups: &[Group]) {
    if groups.is_empty() {
        println!("📭 No groups found");
        return;
    }
    println!("\n👥 Groups ({}):", groups.len());
    for group in groups {
        let shared = if group.is_shared == 1 { " (shared)" } else { "" };
        println!(
            "  {:>4}. {} {}{} {}",
            group.id,
            group.name.bold(),
            group.color,
            shared,
            group.description.dimmed()
        );
    }
}

fn print_group_statistics(stats: &GroupStatistics) {
    println!(
        "  {} groups, {} with a description, {} colors",
        stats.total_groups, stats.has_description, stats.colors_used
    );
}

fn print_contact_statistics(stats: &ContactStatistics) {
    println!(
        "  Your list: {} contacts in {} groups ({} with email, {} with address, {} with notes)",
        stats.total_contacts, stats.total_groups, stats.has_email, stats.has_address, stats.has_notes
    );
}

fn print_users(users: &[UserSummary]) {
    if users.is_empty() {
        println!("📭 No users found");
        return;
    }
    println!("\n📋 Users ({}):", users.len());
    for user in users {
        let joined = user.profile.created_at.format("%Y-%m-%d");
        println!(
            "  {:>4}. {} {} - {} contacts, joined {}",
            user.profile.id,
            user.profile.username.bold(),
            user.profile.email.dimmed(),
            user.contact_count,
            joined
        );
    }
}
