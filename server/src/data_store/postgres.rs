use super::{
    models, schema, BookingFilter, BookingId, BookingOrderingField, BranchId,
    BranchOrderingField, HolidayId, HolidayOrderingField, ListFilter, LittleLemonStore,
    LittleLemonStoreFacade, MenuItemId, MenuItemOrderingField, SlotOccupancy, StoreError, UserId,
    UserOrderingField,
};
use crate::auth_session::SessionToken;
use crate::data_store::auth_token::{AccessRole, AuthToken, Privilege};
use chrono::{Datelike, NaiveDate, NaiveTime};
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;

#[derive(Clone)]
pub struct PgDataStore {
    pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let connection_manager = diesel::r2d2::ConnectionManager::<PgConnection>::new(database_url);
        Ok(Self {
            pool: diesel::r2d2::Pool::builder()
                .test_on_check_out(true)
                .min_idle(Some(2))
                .build(connection_manager)?,
        })
    }
}

impl LittleLemonStore for PgDataStore {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn LittleLemonStoreFacade + 'a>, StoreError> {
        Ok(Box::new(PgDataStoreFacade::with_pooled_connection(
            self.pool.get()?,
        )))
    }
}

pub struct PgDataStoreFacade {
    connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStoreFacade {
    pub fn with_pooled_connection(
        connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
    ) -> Self {
        Self { connection }
    }
}

impl LittleLemonStoreFacade for PgDataStoreFacade {
    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<AuthToken, StoreError> {
        use schema::users::dsl::*;

        let user_is_manager = users
            .select(is_manager)
            .filter(id.eq(session_token.user_id()))
            .first::<bool>(&mut self.connection)?;

        let mut roles = vec![AccessRole::User];
        if user_is_manager {
            roles.push(AccessRole::BranchManager);
        }
        Ok(AuthToken::create_for_session(
            session_token.user_id(),
            roles,
        ))
    }

    fn get_users(
        &mut self,
        auth_token: &AuthToken,
        filter: ListFilter<UserOrderingField>,
    ) -> Result<Vec<models::User>, StoreError> {
        use schema::users::dsl::*;

        let mut query = users.select(models::User::as_select()).into_boxed();
        if !auth_token.has_privilege(Privilege::ManageUsers) {
            let own_id = auth_token.check_privilege_for_user(Privilege::BookTables)?;
            query = query.filter(id.eq(own_id));
        }
        if let Some(search) = filter.search {
            let pattern = format!("%{}%", escape_like_pattern(&search));
            query = query.filter(
                email
                    .ilike(pattern.clone())
                    .or(first_name.ilike(pattern.clone()))
                    .or(last_name.ilike(pattern.clone()))
                    .or(phone_number.like(pattern).assume_not_null()),
            );
        }
        query = match (filter.ordering.field, filter.ordering.descending) {
            (UserOrderingField::Id, false) => query.order_by(id.asc()),
            (UserOrderingField::Id, true) => query.order_by(id.desc()),
            (UserOrderingField::Email, false) => query.order_by(email.asc()),
            (UserOrderingField::Email, true) => query.order_by(email.desc()),
            (UserOrderingField::FirstName, false) => query.order_by(first_name.asc()),
            (UserOrderingField::FirstName, true) => query.order_by(first_name.desc()),
            (UserOrderingField::LastName, false) => query.order_by(last_name.asc()),
            (UserOrderingField::LastName, true) => query.order_by(last_name.desc()),
            (UserOrderingField::IsManager, false) => query.order_by(is_manager.asc()),
            (UserOrderingField::IsManager, true) => query.order_by(is_manager.desc()),
        };
        Ok(query
            .then_order_by(id.asc())
            .load::<models::User>(&mut self.connection)?)
    }

    fn get_user(
        &mut self,
        auth_token: &AuthToken,
        user_id: UserId,
    ) -> Result<models::User, StoreError> {
        use schema::users::dsl::*;
        auth_token.check_owner_or_privilege(user_id, Privilege::ManageUsers)?;

        Ok(users
            .filter(id.eq(user_id))
            .select(models::User::as_select())
            .first::<models::User>(&mut self.connection)?)
    }

    fn get_user_by_email(
        &mut self,
        auth_token: &AuthToken,
        user_email: &str,
    ) -> Result<models::User, StoreError> {
        use schema::users::dsl::*;
        auth_token.check_privilege(Privilege::ManageUsers)?;

        Ok(users
            .filter(email.eq(user_email))
            .select(models::User::as_select())
            .first::<models::User>(&mut self.connection)?)
    }

    fn create_user(
        &mut self,
        auth_token: &AuthToken,
        user: models::NewUser,
    ) -> Result<models::User, StoreError> {
        auth_token.check_privilege(Privilege::ManageUsers)?;

        Ok(diesel::insert_into(schema::users::table)
            .values(&user)
            .returning(models::User::as_returning())
            .get_result::<models::User>(&mut self.connection)?)
    }

    fn update_user(
        &mut self,
        auth_token: &AuthToken,
        user_id: UserId,
        patch: models::UserPatch,
    ) -> Result<models::User, StoreError> {
        use schema::users::dsl::*;
        auth_token.check_owner_or_privilege(user_id, Privilege::ManageUsers)?;
        if patch.is_manager.is_some() {
            auth_token.check_privilege(Privilege::ManageUsers)?;
        }

        if patch.is_empty() {
            return self.get_user(auth_token, user_id);
        }
        Ok(diesel::update(users)
            .filter(id.eq(user_id))
            .set(&patch)
            .returning(models::User::as_returning())
            .get_result::<models::User>(&mut self.connection)?)
    }

    fn delete_user(&mut self, auth_token: &AuthToken, user_id: UserId) -> Result<(), StoreError> {
        use schema::users::dsl::*;
        auth_token.check_owner_or_privilege(user_id, Privilege::ManageUsers)?;

        let count = diesel::delete(users)
            .filter(id.eq(user_id))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn get_branches(
        &mut self,
        auth_token: &AuthToken,
        filter: ListFilter<BranchOrderingField>,
    ) -> Result<Vec<models::Branch>, StoreError> {
        use schema::restaurant_branches::dsl::*;
        auth_token.check_privilege(Privilege::ManageBranches)?;

        let mut query = restaurant_branches
            .select(models::Branch::as_select())
            .into_boxed();
        if let Some(search) = filter.search {
            let pattern = format!("%{}%", escape_like_pattern(&search));
            query = query.filter(branch.ilike(pattern.clone()).or(phone.like(pattern)));
        }
        query = match (filter.ordering.field, filter.ordering.descending) {
            (BranchOrderingField::Branch, false) => query.order_by(branch.asc()),
            (BranchOrderingField::Branch, true) => query.order_by(branch.desc()),
        };
        Ok(query.load::<models::Branch>(&mut self.connection)?)
    }

    fn get_branch(
        &mut self,
        auth_token: &AuthToken,
        branch_id: BranchId,
    ) -> Result<models::Branch, StoreError> {
        use schema::restaurant_branches::dsl::*;
        auth_token.check_privilege(Privilege::ManageBranches)?;

        Ok(restaurant_branches
            .filter(id.eq(branch_id))
            .select(models::Branch::as_select())
            .first::<models::Branch>(&mut self.connection)?)
    }

    fn get_branch_by_label(
        &mut self,
        auth_token: &AuthToken,
        label: &str,
    ) -> Result<models::Branch, StoreError> {
        use schema::restaurant_branches::dsl::*;
        auth_token.check_privilege(Privilege::ShowBranchInfo)?;

        Ok(restaurant_branches
            .filter(branch.eq(label))
            .select(models::Branch::as_select())
            .first::<models::Branch>(&mut self.connection)?)
    }

    fn list_branch_labels(&mut self, auth_token: &AuthToken) -> Result<Vec<String>, StoreError> {
        use schema::restaurant_branches::dsl::*;
        auth_token.check_privilege(Privilege::ShowBranchInfo)?;

        Ok(restaurant_branches
            .select(branch)
            .order_by(branch.asc())
            .load::<String>(&mut self.connection)?)
    }

    fn create_branch(
        &mut self,
        auth_token: &AuthToken,
        new_branch: models::NewBranch,
    ) -> Result<models::Branch, StoreError> {
        auth_token.check_privilege(Privilege::ManageBranches)?;

        Ok(diesel::insert_into(schema::restaurant_branches::table)
            .values(&new_branch)
            .returning(models::Branch::as_returning())
            .get_result::<models::Branch>(&mut self.connection)?)
    }

    fn update_branch(
        &mut self,
        auth_token: &AuthToken,
        branch_id: BranchId,
        new_branch: models::NewBranch,
    ) -> Result<models::Branch, StoreError> {
        use schema::restaurant_branches::dsl::*;
        auth_token.check_privilege(Privilege::ManageBranches)?;

        Ok(diesel::update(restaurant_branches)
            .filter(id.eq(branch_id))
            .set(&new_branch)
            .returning(models::Branch::as_returning())
            .get_result::<models::Branch>(&mut self.connection)?)
    }

    fn delete_branch(
        &mut self,
        auth_token: &AuthToken,
        branch_id: BranchId,
    ) -> Result<(), StoreError> {
        use schema::restaurant_branches::dsl::*;
        auth_token.check_privilege(Privilege::ManageBranches)?;

        let count = diesel::delete(restaurant_branches)
            .filter(id.eq(branch_id))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn get_bookings_filtered(
        &mut self,
        auth_token: &AuthToken,
        filter: BookingFilter,
    ) -> Result<Vec<models::FullBooking>, StoreError> {
        use schema::bookings;
        if filter.user.is_some() && filter.user == auth_token.user_id() {
            auth_token.check_privilege(Privilege::BookTables)?;
        } else {
            auth_token.check_privilege(Privilege::ManageAllBookings)?;
        }

        let mut query = bookings::table
            .inner_join(schema::restaurant_branches::table)
            .inner_join(schema::users::table)
            .select((
                models::Booking::as_select(),
                schema::restaurant_branches::branch,
                schema::users::email,
            ))
            .into_boxed();
        if let Some(user) = filter.user {
            query = query.filter(bookings::user_id.eq(user));
        }
        if let Some(branch) = filter.branch {
            query = query.filter(bookings::branch_id.eq(branch));
        }
        if let Some(date) = filter.date {
            query = query.filter(bookings::booking_date.eq(date));
        }
        if let Some(search) = filter.search {
            let pattern = format!("%{}%", escape_like_pattern(&search));
            query = query.filter(
                bookings::name
                    .ilike(pattern.clone())
                    .or(bookings::phone.like(pattern.clone()))
                    .or(schema::users::email.ilike(pattern)),
            );
        }
        query = match (filter.ordering.field, filter.ordering.descending) {
            (BookingOrderingField::CreatedAt, false) => query.order_by(bookings::created_at.asc()),
            (BookingOrderingField::CreatedAt, true) => query.order_by(bookings::created_at.desc()),
            (BookingOrderingField::Name, false) => query.order_by(bookings::name.asc()),
            (BookingOrderingField::Name, true) => query.order_by(bookings::name.desc()),
            (BookingOrderingField::BookingDate, false) => query.order_by((
                bookings::booking_date.asc(),
                bookings::start_time.asc(),
            )),
            (BookingOrderingField::BookingDate, true) => query.order_by((
                bookings::booking_date.desc(),
                bookings::start_time.desc(),
            )),
            (BookingOrderingField::Status, false) => query.order_by(bookings::status.asc()),
            (BookingOrderingField::Status, true) => query.order_by(bookings::status.desc()),
        };

        Ok(query
            .then_order_by(bookings::id.asc())
            .load::<(models::Booking, String, String)>(&mut self.connection)?
            .into_iter()
            .map(|(booking, branch_label, user_email)| models::FullBooking {
                booking,
                branch_label,
                user_email,
            })
            .collect())
    }

    fn get_booking(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
    ) -> Result<models::FullBooking, StoreError> {
        let booking = load_full_booking(&mut self.connection, booking_id)?;
        auth_token.check_owner_or_privilege(booking.booking.user_id, Privilege::ManageAllBookings)?;
        Ok(booking)
    }

    fn has_overlapping_active_booking(
        &mut self,
        auth_token: &AuthToken,
        the_user_id: UserId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<bool, StoreError> {
        use schema::bookings::dsl::*;
        auth_token.check_owner_or_privilege(the_user_id, Privilege::ManageAllBookings)?;

        Ok(diesel::select(exists(
            bookings
                .filter(user_id.eq(the_user_id))
                .filter(booking_date.eq(date))
                .filter(status.eq_any([
                    models::BookingStatus::Pending,
                    models::BookingStatus::Booked,
                ]))
                .filter(start_time.lt(end))
                .filter(end_time.gt(start)),
        ))
        .get_result::<bool>(&mut self.connection)?)
    }

    fn count_overlapping_booked(
        &mut self,
        auth_token: &AuthToken,
        branch_id: BranchId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<i64, StoreError> {
        auth_token.check_privilege(Privilege::ShowBranchInfo)?;
        Ok(count_overlapping_booked(
            &mut self.connection,
            branch_id,
            date,
            start,
            end,
        )?)
    }

    fn create_pending_booking(
        &mut self,
        auth_token: &AuthToken,
        booking: models::NewBooking,
    ) -> Result<models::Booking, StoreError> {
        let own_id = auth_token.check_privilege_for_user(Privilege::BookTables)?;
        if booking.user_id != own_id {
            return Err(StoreError::PermissionDenied {
                required_privilege: Privilege::ManageAllBookings,
            });
        }

        Ok(diesel::insert_into(schema::bookings::table)
            .values(&booking)
            .returning(models::Booking::as_returning())
            .get_result::<models::Booking>(&mut self.connection)?)
    }

    fn settle_pending_booking(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
        admit: &dyn Fn(&SlotOccupancy) -> bool,
    ) -> Result<(models::Booking, SlotOccupancy), StoreError> {
        use schema::bookings::dsl::*;
        auth_token.check_privilege(Privilege::BookTables)?;

        self.connection.transaction(|connection| {
            let booking = bookings
                .filter(id.eq(booking_id))
                .select(models::Booking::as_select())
                .first::<models::Booking>(connection)?;
            auth_token.check_owner_or_privilege(booking.user_id, Privilege::ManageAllBookings)?;
            if booking.status != models::BookingStatus::Pending {
                return Err(StoreError::ConcurrentEditConflict);
            }

            // Always user before branch, so concurrent settlements can't deadlock
            lock_user_date(connection, booking.user_id, booking.booking_date)?;
            lock_branch_date(connection, booking.branch_id, booking.booking_date)?;
            let occupancy = SlotOccupancy {
                table_count: schema::restaurant_branches::table
                    .find(booking.branch_id)
                    .select(schema::restaurant_branches::table_count)
                    .first::<i32>(connection)?,
                overlapping_booked: count_overlapping_booked(
                    connection,
                    booking.branch_id,
                    booking.booking_date,
                    booking.start_time,
                    booking.end_time,
                )?,
                user_has_overlap: diesel::select(exists(
                    bookings
                        .filter(id.ne(booking.id))
                        .filter(user_id.eq(booking.user_id))
                        .filter(booking_date.eq(booking.booking_date))
                        .filter(status.eq(models::BookingStatus::Booked))
                        .filter(start_time.lt(booking.end_time))
                        .filter(end_time.gt(booking.start_time)),
                ))
                .get_result::<bool>(connection)?,
            };
            let new_status = if admit(&occupancy) {
                models::BookingStatus::Booked
            } else {
                models::BookingStatus::Failed
            };

            let settled = diesel::update(bookings)
                .filter(id.eq(booking_id))
                .filter(status.eq(models::BookingStatus::Pending))
                .set(status.eq(new_status))
                .returning(models::Booking::as_returning())
                .get_result::<models::Booking>(connection)
                .optional()?
                .ok_or(StoreError::ConcurrentEditConflict)?;
            Ok((settled, occupancy))
        })
    }

    fn mark_booking_failed(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
    ) -> Result<(), StoreError> {
        use schema::bookings::dsl::*;

        self.connection.transaction(|connection| {
            let owner = bookings
                .filter(id.eq(booking_id))
                .select(user_id)
                .first::<UserId>(connection)?;
            auth_token.check_owner_or_privilege(owner, Privilege::ManageAllBookings)?;

            let count = diesel::update(bookings)
                .filter(id.eq(booking_id))
                .filter(status.eq(models::BookingStatus::Pending))
                .set(status.eq(models::BookingStatus::Failed))
                .execute(connection)?;
            if count == 0 {
                return Err(StoreError::ConcurrentEditConflict);
            }
            Ok(())
        })
    }

    fn update_booking(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
        expected_status: models::BookingStatus,
        patch: models::BookingPatch,
    ) -> Result<models::FullBooking, StoreError> {
        use schema::bookings::dsl::*;

        self.connection.transaction(|connection| {
            let current = load_full_booking(connection, booking_id)?;
            auth_token
                .check_owner_or_privilege(current.booking.user_id, Privilege::ManageAllBookings)?;
            if current.booking.status != expected_status {
                return Err(StoreError::ConcurrentEditConflict);
            }
            if patch.is_empty() {
                return Ok(current);
            }

            let count = diesel::update(bookings)
                .filter(id.eq(booking_id))
                .filter(status.eq(expected_status))
                .set(&patch)
                .execute(connection)?;
            if count == 0 {
                return Err(StoreError::ConcurrentEditConflict);
            }
            load_full_booking(connection, booking_id)
        })
    }

    fn delete_booking(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
    ) -> Result<(), StoreError> {
        use schema::bookings::dsl::*;

        self.connection.transaction(|connection| {
            let owner = bookings
                .filter(id.eq(booking_id))
                .select(user_id)
                .first::<UserId>(connection)?;
            auth_token.check_owner_or_privilege(owner, Privilege::ManageAllBookings)?;

            diesel::delete(bookings)
                .filter(id.eq(booking_id))
                .execute(connection)?;
            Ok(())
        })
    }

    fn complete_bookings_before(
        &mut self,
        auth_token: &AuthToken,
        before: NaiveDate,
    ) -> Result<usize, StoreError> {
        use schema::bookings::dsl::*;
        auth_token.check_privilege(Privilege::ManageAllBookings)?;

        Ok(diesel::update(bookings)
            .filter(status.eq(models::BookingStatus::Booked))
            .filter(booking_date.lt(before))
            .set(status.eq(models::BookingStatus::Completed))
            .execute(&mut self.connection)?)
    }

    fn get_menu_items(
        &mut self,
        filter: ListFilter<MenuItemOrderingField>,
    ) -> Result<Vec<models::MenuItem>, StoreError> {
        use schema::menu_items::dsl::*;

        let mut query = menu_items
            .select(models::MenuItem::as_select())
            .into_boxed();
        if let Some(search) = filter.search {
            let pattern = format!("%{}%", escape_like_pattern(&search));
            query = query.filter(title.ilike(pattern.clone()).or(category.ilike(pattern)));
        }
        query = match (filter.ordering.field, filter.ordering.descending) {
            (MenuItemOrderingField::Id, false) => query.order_by(id.asc()),
            (MenuItemOrderingField::Id, true) => query.order_by(id.desc()),
            (MenuItemOrderingField::Title, false) => query.order_by(title.asc()),
            (MenuItemOrderingField::Title, true) => query.order_by(title.desc()),
            (MenuItemOrderingField::Description, false) => query.order_by(description.asc()),
            (MenuItemOrderingField::Description, true) => query.order_by(description.desc()),
            (MenuItemOrderingField::Category, false) => query.order_by(category.asc()),
            (MenuItemOrderingField::Category, true) => query.order_by(category.desc()),
            (MenuItemOrderingField::Price, false) => query.order_by(price_cents.asc()),
            (MenuItemOrderingField::Price, true) => query.order_by(price_cents.desc()),
            (MenuItemOrderingField::Inventory, false) => query.order_by(inventory.asc()),
            (MenuItemOrderingField::Inventory, true) => query.order_by(inventory.desc()),
        };
        Ok(query
            .then_order_by(id.asc())
            .load::<models::MenuItem>(&mut self.connection)?)
    }

    fn get_menu_item(&mut self, menu_item_id: MenuItemId) -> Result<models::MenuItem, StoreError> {
        use schema::menu_items::dsl::*;

        Ok(menu_items
            .filter(id.eq(menu_item_id))
            .select(models::MenuItem::as_select())
            .first::<models::MenuItem>(&mut self.connection)?)
    }

    fn create_menu_item(
        &mut self,
        auth_token: &AuthToken,
        menu_item: models::NewMenuItem,
    ) -> Result<models::MenuItem, StoreError> {
        auth_token.check_privilege(Privilege::ManageMenu)?;

        Ok(diesel::insert_into(schema::menu_items::table)
            .values(&menu_item)
            .returning(models::MenuItem::as_returning())
            .get_result::<models::MenuItem>(&mut self.connection)?)
    }

    fn update_menu_item(
        &mut self,
        auth_token: &AuthToken,
        menu_item_id: MenuItemId,
        menu_item: models::NewMenuItem,
    ) -> Result<models::MenuItem, StoreError> {
        use schema::menu_items::dsl::*;
        auth_token.check_privilege(Privilege::ManageMenu)?;

        Ok(diesel::update(menu_items)
            .filter(id.eq(menu_item_id))
            .set(&menu_item)
            .returning(models::MenuItem::as_returning())
            .get_result::<models::MenuItem>(&mut self.connection)?)
    }

    fn delete_menu_item(
        &mut self,
        auth_token: &AuthToken,
        menu_item_id: MenuItemId,
    ) -> Result<(), StoreError> {
        use schema::menu_items::dsl::*;
        auth_token.check_privilege(Privilege::ManageMenu)?;

        let count = diesel::delete(menu_items)
            .filter(id.eq(menu_item_id))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn get_holidays(
        &mut self,
        auth_token: &AuthToken,
        filter: ListFilter<HolidayOrderingField>,
    ) -> Result<Vec<models::Holiday>, StoreError> {
        use schema::holidays::dsl::*;
        auth_token.check_privilege(Privilege::ManageHolidays)?;

        let mut query = holidays
            .select(models::Holiday::as_select())
            .into_boxed();
        if let Some(search) = filter.search {
            let pattern = format!("%{}%", escape_like_pattern(&search));
            query = match search.parse::<NaiveDate>() {
                Ok(date) => query.filter(description.ilike(pattern).or(holiday_date.eq(date))),
                Err(_) => query.filter(description.ilike(pattern)),
            };
        }
        query = match (filter.ordering.field, filter.ordering.descending) {
            (HolidayOrderingField::HolidayDate, false) => query.order_by(holiday_date.asc()),
            (HolidayOrderingField::HolidayDate, true) => query.order_by(holiday_date.desc()),
            (HolidayOrderingField::Description, false) => query.order_by(description.asc()),
            (HolidayOrderingField::Description, true) => query.order_by(description.desc()),
        };
        Ok(query
            .then_order_by(id.asc())
            .load::<models::Holiday>(&mut self.connection)?)
    }

    fn get_holiday(
        &mut self,
        auth_token: &AuthToken,
        holiday_id: HolidayId,
    ) -> Result<models::Holiday, StoreError> {
        use schema::holidays::dsl::*;
        auth_token.check_privilege(Privilege::ManageHolidays)?;

        Ok(holidays
            .filter(id.eq(holiday_id))
            .select(models::Holiday::as_select())
            .first::<models::Holiday>(&mut self.connection)?)
    }

    fn create_holiday(
        &mut self,
        auth_token: &AuthToken,
        holiday: models::NewHoliday,
    ) -> Result<models::Holiday, StoreError> {
        auth_token.check_privilege(Privilege::ManageHolidays)?;

        Ok(diesel::insert_into(schema::holidays::table)
            .values(&holiday)
            .returning(models::Holiday::as_returning())
            .get_result::<models::Holiday>(&mut self.connection)?)
    }

    fn update_holiday(
        &mut self,
        auth_token: &AuthToken,
        holiday_id: HolidayId,
        holiday: models::NewHoliday,
    ) -> Result<models::Holiday, StoreError> {
        use schema::holidays::dsl::*;
        auth_token.check_privilege(Privilege::ManageHolidays)?;

        Ok(diesel::update(holidays)
            .filter(id.eq(holiday_id))
            .set(&holiday)
            .returning(models::Holiday::as_returning())
            .get_result::<models::Holiday>(&mut self.connection)?)
    }

    fn delete_holiday(
        &mut self,
        auth_token: &AuthToken,
        holiday_id: HolidayId,
    ) -> Result<(), StoreError> {
        use schema::holidays::dsl::*;
        auth_token.check_privilege(Privilege::ManageHolidays)?;

        let count = diesel::delete(holidays)
            .filter(id.eq(holiday_id))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }
}

/// Acquire the transaction-scoped advisory lock for bookings of one branch on one date.
///
/// Must be called within a transaction. The lock is released automatically on commit or
/// rollback.
fn lock_branch_date(
    connection: &mut PgConnection,
    branch_id: BranchId,
    date: NaiveDate,
) -> Result<(), StoreError> {
    diesel::sql_query("SELECT pg_advisory_xact_lock($1, $2)")
        .bind::<diesel::sql_types::Integer, _>(branch_id)
        .bind::<diesel::sql_types::Integer, _>(date.num_days_from_ce())
        .execute(connection)?;
    Ok(())
}

/// Acquire the transaction-scoped advisory lock for bookings of one user on one date.
///
/// Uses the single-key variant of the advisory lock functions, whose key space is separate from
/// the two-key variant used by [lock_branch_date].
fn lock_user_date(
    connection: &mut PgConnection,
    user_id: UserId,
    date: NaiveDate,
) -> Result<(), StoreError> {
    let key = ((user_id as i64) << 32) | (date.num_days_from_ce() as u32 as i64);
    diesel::sql_query("SELECT pg_advisory_xact_lock($1)")
        .bind::<diesel::sql_types::BigInt, _>(key)
        .execute(connection)?;
    Ok(())
}

fn count_overlapping_booked(
    connection: &mut PgConnection,
    the_branch_id: BranchId,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> QueryResult<i64> {
    use schema::bookings::dsl::*;

    bookings
        .filter(branch_id.eq(the_branch_id))
        .filter(booking_date.eq(date))
        .filter(status.eq(models::BookingStatus::Booked))
        .filter(start_time.lt(end))
        .filter(end_time.gt(start))
        .count()
        .get_result::<i64>(connection)
}

fn load_full_booking(
    connection: &mut PgConnection,
    booking_id: BookingId,
) -> Result<models::FullBooking, StoreError> {
    use schema::bookings;

    let (booking, branch_label, user_email) = bookings::table
        .inner_join(schema::restaurant_branches::table)
        .inner_join(schema::users::table)
        .filter(bookings::id.eq(booking_id))
        .select((
            models::Booking::as_select(),
            schema::restaurant_branches::branch,
            schema::users::email,
        ))
        .first::<(models::Booking, String, String)>(connection)?;
    Ok(models::FullBooking {
        booking,
        branch_label,
        user_email,
    })
}

/// Escape the LIKE wildcard characters in a user-provided search term
fn escape_like_pattern(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Get a human-readable description of the consistency expectation that is checked by a specific
/// constraint in our Postgres database schema by the constraint's name.
///
/// These are visible to the user when creating or updating entities inconsistently via the REST
/// API.
///
/// Returns None, when no human-readable description is present of the given constraint name. This
/// may be the case when we don't expect this constraint to be violated by a user interaction.
pub fn description_for_postgres_constraint(constraint_name: &str) -> Option<&'static str> {
    match constraint_name {
        "bookings_branch_id_fkey" => Some("Booking's branch must reference an existing branch. Branches with bookings cannot be deleted."),
        "bookings_user_id_fkey" => Some("Booking's user must reference an existing user."),
        "bookings_time_range" => Some("Booking's start_time must be earlier than end_time."),
        "bookings_guest_count" => Some("Booking's no_of_guests must be between 1 and 10."),
        "bookings_status" => Some("Booking's status must be one of PENDING, BOOKED, FAILED, CANCELED, COMPLETED."),
        "restaurant_branches_working_hours" => Some("Branch's opening_time must be earlier than closing_time."),
        "restaurant_branches_table_count" => Some("Branch's no_of_tables must not be negative."),
        "restaurant_branches_phone_format" => Some("Branch's phone must consist of exactly 10 digits."),
        "users_phone_number_format" => Some("User's phone_number must consist of exactly 10 digits."),
        "menu_items_price" => Some("Menu item's priceCents must not be negative."),
        "menu_items_inventory" => Some("Menu item's inventory must not be negative."),
        _ => None,
    }
}
